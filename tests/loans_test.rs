mod common;

use anyhow::Result;
use chitbook::application::{AppError, LoanUserEdit, NewLoanUser};
use chitbook::domain::{LoanStatus, LoanType, TransactionKind, MAX_AMOUNT};
use common::{new_loan, register, test_service};
use uuid::Uuid;

#[tokio::test]
async fn test_register_normal_loan() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .register_loan_user(new_loan("Meena", 10_000, LoanType::Normal))
        .await?;

    assert_eq!(result.quote.interest, 1_000);
    assert_eq!(result.quote.disbursed_amount, 9_000);

    let stored = service.get_loan_user(result.user.id).await?;
    assert_eq!(stored.name, "Meena");
    assert_eq!(stored.loan_amount, 10_000);
    assert_eq!(stored.disbursed_amount, 9_000);
    assert_eq!(stored.paid_amount, 0);
    assert_eq!(stored.status, LoanStatus::Active);
    assert_eq!(stored.loan_type, LoanType::Normal);
    assert_eq!(stored.transactions.len(), 1);
    assert_eq!(stored.transactions[0].kind, TransactionKind::Debit);
    assert_eq!(stored.transactions[0].amount, -10_000);

    Ok(())
}

#[tokio::test]
async fn test_register_keeps_contact_details() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .register_loan_user(NewLoanUser {
            name: "  Kumar  ".to_string(),
            contact: Some("+91 98765 43210".to_string()),
            id_proof: Some("   ".to_string()),
            principal: 5_000,
            loan_type: LoanType::Emi,
        })
        .await?;

    let stored = service.get_loan_user(result.user.id).await?;
    assert_eq!(stored.name, "Kumar");
    assert_eq!(stored.contact.as_deref(), Some("+91 98765 43210"));
    assert_eq!(stored.id_proof, None);
    assert_eq!(stored.disbursed_amount, 4_400);

    Ok(())
}

#[tokio::test]
async fn test_register_rejects_invalid_input() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .register_loan_user(new_loan("   ", 10_000, LoanType::Normal))
        .await;
    assert!(matches!(result, Err(AppError::InvalidName)));

    for principal in [0, -1_000, 1_500, 51_000] {
        let result = service
            .register_loan_user(new_loan("Meena", principal, LoanType::Normal))
            .await;
        assert!(
            matches!(result, Err(AppError::InvalidAmount(_))),
            "principal {} should be rejected",
            principal
        );
    }

    assert!(service.list_loan_users().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_full_repayment_completes_loan() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 10_000, LoanType::Normal).await?;

    let result = service.post_repayment(user.id, 10_000).await?;

    assert_eq!(result.paid_amount, 10_000);
    assert_eq!(result.status, LoanStatus::Completed);
    assert_eq!(result.balance(), 0);

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.paid_amount, 10_000);
    assert_eq!(stored.status, LoanStatus::Completed);
    assert_eq!(stored.transactions.len(), 2);
    assert_eq!(stored.transactions[1].kind, TransactionKind::Credit);
    assert_eq!(stored.transactions[1].amount, 10_000);
    assert_eq!(stored.transactions[1].description, "repayment");

    Ok(())
}

#[tokio::test]
async fn test_split_repayments_match_single_repayment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let split = register(&service, "A", 20_000, LoanType::Emi).await?;
    let single = register(&service, "B", 20_000, LoanType::Emi).await?;

    service.post_repayment(split.id, 3_000).await?;
    service.post_repayment(split.id, 4_000).await?;
    service.post_repayment(single.id, 7_000).await?;

    let split = service.get_loan_user(split.id).await?;
    let single = service.get_loan_user(single.id).await?;
    assert_eq!(split.paid_amount, 7_000);
    assert_eq!(split.paid_amount, single.paid_amount);
    assert_eq!(split.status, LoanStatus::Active);
    assert_eq!(split.transactions.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_overpayment_is_accepted() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 5_000, LoanType::Normal).await?;

    service.post_repayment(user.id, 5_000).await?;
    let result = service.post_repayment(user.id, 1_000).await?;

    assert_eq!(result.paid_amount, 6_000);
    assert_eq!(result.status, LoanStatus::Completed);
    assert_eq!(result.balance(), -1_000);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_repayments_are_not_lost() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 50_000, LoanType::Normal).await?;

    let (a, b, c) = tokio::join!(
        service.post_repayment(user.id, 1_000),
        service.post_repayment(user.id, 2_000),
        service.post_repayment(user.id, 3_000),
    );
    a?;
    b?;
    c?;

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.paid_amount, 6_000);
    assert_eq!(stored.transactions.len(), 4);

    Ok(())
}

#[tokio::test]
async fn test_edit_does_not_undo_concurrent_repayment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 50_000, LoanType::Normal).await?;

    for round in 1..=20 {
        let rename = LoanUserEdit {
            name: Some(format!("Meena {}", round)),
            ..Default::default()
        };
        let (edited, repaid) = tokio::join!(
            service.edit_loan_user(user.id, rename),
            service.post_repayment(user.id, 1_000),
        );
        edited?;
        repaid?;

        let stored = service.get_loan_user(user.id).await?;
        assert_eq!(stored.paid_amount, round * 1_000, "round {}", round);
    }

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.name, "Meena 20");
    assert_eq!(stored.transactions.len(), 21);
    assert_eq!(stored.status, LoanStatus::Active);

    Ok(())
}

#[tokio::test]
async fn test_status_stays_completed_after_more_repayments() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Kumar", 5_000, LoanType::Emi).await?;

    let result = service.post_repayment(user.id, 4_000).await?;
    assert_eq!(result.status, LoanStatus::Active);

    let result = service.post_repayment(user.id, 1_000).await?;
    assert_eq!(result.status, LoanStatus::Completed);

    let result = service.post_repayment(user.id, 500).await?;
    assert_eq!(result.status, LoanStatus::Completed);
    assert_eq!(result.balance(), -500);

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.status, LoanStatus::Completed);
    Ok(())
}

#[tokio::test]
async fn test_amounts_above_limit_are_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 10_000, LoanType::Normal).await?;
    service.post_repayment(user.id, 10_000).await?;

    for amount in [MAX_AMOUNT + 1, i64::MAX] {
        let result = service.post_repayment(user.id, amount).await;
        assert!(matches!(result, Err(AppError::InvalidAmount(_))));
    }

    let result = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                paid_amount: Some(i64::MAX),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    // The limit itself is accepted
    let result = service.post_repayment(user.id, MAX_AMOUNT).await?;
    assert_eq!(result.paid_amount, 10_000 + MAX_AMOUNT);

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.paid_amount, 10_000 + MAX_AMOUNT);
    assert_eq!(stored.transactions.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_repayment_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 10_000, LoanType::Normal).await?;

    let result = service.post_repayment(user.id, 0).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service.post_repayment(user.id, -500).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service.post_repayment(Uuid::new_v4(), 500).await;
    assert!(matches!(result, Err(AppError::LoanUserNotFound(_))));

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.paid_amount, 0);
    assert_eq!(stored.transactions.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_edit_rederives_status() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 10_000, LoanType::Normal).await?;

    let edited = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                name: Some("Meena R".to_string()),
                contact: Some("99400 12345".to_string()),
                paid_amount: Some(10_000),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(edited.status, LoanStatus::Completed);

    let edited = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                loan_amount: Some(0),
                paid_amount: Some(0),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(edited.status, LoanStatus::NoLoan);

    let stored = service.get_loan_user(user.id).await?;
    assert_eq!(stored.name, "Meena R");
    assert_eq!(stored.contact.as_deref(), Some("99400 12345"));
    assert_eq!(stored.status, LoanStatus::NoLoan);
    // Edits never touch the log
    assert_eq!(stored.transactions.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_edit_only_touches_given_fields() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = service
        .register_loan_user(NewLoanUser {
            name: "Kumar".to_string(),
            contact: Some("98765 43210".to_string()),
            id_proof: Some("AADHAAR-1234".to_string()),
            principal: 5_000,
            loan_type: LoanType::Emi,
        })
        .await?
        .user;
    service.post_repayment(user.id, 3_000).await?;

    // Lowering the face value completes the loan against the stored total
    let edited = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                loan_amount: Some(3_000),
                contact: Some("  ".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(edited.status, LoanStatus::Completed);
    assert_eq!(edited.paid_amount, 3_000);
    assert_eq!(edited.contact, None);
    assert_eq!(edited.id_proof.as_deref(), Some("AADHAAR-1234"));
    assert_eq!(edited.name, "Kumar");
    assert_eq!(edited.loan_type, LoanType::Emi);
    assert_eq!(edited.disbursed_amount, 4_400);

    Ok(())
}

#[tokio::test]
async fn test_edit_rejects_bad_values() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let user = register(&service, "Meena", 10_000, LoanType::Normal).await?;

    let result = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                name: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidName)));

    let result = service
        .edit_loan_user(
            user.id,
            LoanUserEdit {
                paid_amount: Some(-1),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    let result = service
        .edit_loan_user(Uuid::new_v4(), LoanUserEdit::default())
        .await;
    assert!(matches!(result, Err(AppError::LoanUserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_delete_loan_user() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let keep = register(&service, "Keep", 1_000, LoanType::Normal).await?;
    let gone = register(&service, "Gone", 2_000, LoanType::Normal).await?;
    service.post_repayment(gone.id, 500).await?;

    let deleted = service.delete_loan_user(gone.id).await?;
    assert_eq!(deleted.name, "Gone");

    let result = service.get_loan_user(gone.id).await;
    assert!(matches!(result, Err(AppError::LoanUserNotFound(_))));

    let remaining = service.list_loan_users().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);
    assert_eq!(remaining[0].transactions.len(), 1);

    let result = service.delete_loan_user(gone.id).await;
    assert!(matches!(result, Err(AppError::LoanUserNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_loan_users_sorted_with_logs() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let zara = register(&service, "Zara", 3_000, LoanType::Emi).await?;
    register(&service, "Anand", 4_000, LoanType::Normal).await?;
    service.post_repayment(zara.id, 1_000).await?;

    let users = service.list_loan_users().await?;
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "Anand");
    assert_eq!(users[0].transactions.len(), 1);
    assert_eq!(users[1].name, "Zara");
    assert_eq!(users[1].transactions.len(), 2);
    assert_eq!(users[1].paid_amount, 1_000);

    Ok(())
}
