use std::fmt;

/// Money is tracked in whole rupees. The business never deals in paise,
/// so every amount in the ledger is an integer number of rupees.
pub type Rupees = i64;

/// Largest amount accepted for a single posting, edit or vault adjustment
/// (₹100 crore). Keeps every running total far from `i64` overflow.
pub const MAX_AMOUNT: Rupees = 1_000_000_000;

/// Format rupees for display with Indian digit grouping and no decimals.
/// Example: 100000 -> "₹1,00,000", -12100 -> "-₹12,100"
pub fn format_rupees(amount: Rupees) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    format!("{}₹{}", sign, group_indian(amount.unsigned_abs()))
}

/// Group digits the Indian way: the last three digits together, then pairs.
fn group_indian(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

/// Parse a user-entered amount into whole rupees.
/// Accepts an optional leading "₹", thousands separators and a trailing
/// ".0"/".00". Fractional rupees are rejected.
/// Example: "10000" -> 10000, "₹1,00,000" -> 100000, "500.00" -> 500
pub fn parse_rupees(input: &str) -> Result<Rupees, ParseAmountError> {
    let input = input.trim();
    let (negative, input) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let input = input.strip_prefix('₹').unwrap_or(input);
    let cleaned: String = input.chars().filter(|c| *c != ',').collect();

    if cleaned.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let whole = match cleaned.split_once('.') {
        Some((units, fraction)) => {
            if !fraction.chars().all(|c| c == '0') {
                return Err(ParseAmountError::Fractional);
            }
            units
        }
        None => cleaned.as_str(),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let value: Rupees = whole
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat)?;
    Ok(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
    Fractional,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "amount is empty"),
            ParseAmountError::InvalidFormat => write!(f, "invalid amount format"),
            ParseAmountError::Fractional => write!(f, "amounts must be whole rupees"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(0), "₹0");
        assert_eq!(format_rupees(999), "₹999");
        assert_eq!(format_rupees(1000), "₹1,000");
        assert_eq!(format_rupees(12100), "₹12,100");
        assert_eq!(format_rupees(100000), "₹1,00,000");
        assert_eq!(format_rupees(12345678), "₹1,23,45,678");
        assert_eq!(format_rupees(-10000), "-₹10,000");
    }

    #[test]
    fn test_parse_rupees() {
        assert_eq!(parse_rupees("10000"), Ok(10000));
        assert_eq!(parse_rupees(" 500 "), Ok(500));
        assert_eq!(parse_rupees("₹1,00,000"), Ok(100000));
        assert_eq!(parse_rupees("500.00"), Ok(500));
        assert_eq!(parse_rupees("-2500"), Ok(-2500));
        assert_eq!(parse_rupees("-₹2,500"), Ok(-2500));
    }

    #[test]
    fn test_parse_rupees_invalid() {
        assert_eq!(parse_rupees(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_rupees("abc"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_rupees("12.50"), Err(ParseAmountError::Fractional));
        assert_eq!(parse_rupees("1.2.3"), Err(ParseAmountError::Fractional));
        assert_eq!(parse_rupees("--500"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_rupees("-+500"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_rupees("₹₹500"), Err(ParseAmountError::InvalidFormat));
    }
}
