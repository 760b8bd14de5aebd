use std::future::Future;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::domain::{VerificationOutcome, VerificationRequest};

use super::{AppError, VerifierConfig};

/// Face-match boundary used to gate onboarding.
pub trait IdentityVerifier {
    fn verify(
        &self,
        request: &VerificationRequest,
    ) -> impl Future<Output = Result<VerificationOutcome, AppError>> + Send;
}

/// Delegates verification to an external program: the request is written
/// to its stdin as JSON and the outcome is read from its stdout.
#[derive(Debug, Clone)]
pub struct CommandVerifier {
    program: String,
    args: Vec<String>,
}

impl CommandVerifier {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Self {
        Self::new(config.command.clone(), config.args.clone())
    }
}

impl IdentityVerifier for CommandVerifier {
    async fn verify(&self, request: &VerificationRequest) -> Result<VerificationOutcome, AppError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| AppError::VerificationFailed(format!("encode request: {}", e)))?;

        tracing::debug!(program = %self.program, "running identity verifier");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AppError::VerificationFailed(format!("spawn {}: {}", self.program, e)))?;

        // Feed stdin while stdout and stderr are drained, so a chatty
        // verifier cannot fill a pipe and stall on a large request.
        let stdin = child.stdin.take();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&payload).await?;
                // Closing stdin signals the end of the request
                stdin.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        });

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AppError::VerificationFailed(format!("wait: {}", e)))?;

        match writer.await {
            Ok(Ok(())) => {}
            // The program may answer without reading the whole request
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                tracing::debug!(program = %self.program, "verifier closed stdin early");
            }
            Ok(Err(e)) => {
                return Err(AppError::VerificationFailed(format!("write request: {}", e)));
            }
            Err(e) => {
                return Err(AppError::VerificationFailed(format!("request writer: {}", e)));
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::VerificationFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let outcome: VerificationOutcome = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::VerificationFailed(format!("decode outcome: {}", e)))?;

        if !outcome.has_valid_confidence() {
            return Err(AppError::VerificationFailed(format!(
                "confidence {} is outside [0, 1]",
                outcome.confidence
            )));
        }

        Ok(outcome)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::DataUri;

    fn request() -> VerificationRequest {
        VerificationRequest {
            live_photo_data_uri: DataUri::parse("data:image/jpeg;base64,AAAA").unwrap(),
            id_photo_data_uri: DataUri::parse("data:image/jpeg;base64,BBBB").unwrap(),
        }
    }

    fn shell(script: &str) -> CommandVerifier {
        CommandVerifier::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn test_reads_outcome_from_stdout() {
        let verifier =
            shell(r#"cat > /dev/null; echo '{"isMatch": true, "confidence": 0.91, "reason": "same face"}'"#);

        let outcome = verifier.verify(&request()).await.unwrap();
        assert!(outcome.is_match);
        assert_eq!(outcome.confidence, 0.91);
        assert_eq!(outcome.reason.as_deref(), Some("same face"));
    }

    #[tokio::test]
    async fn test_request_is_sent_on_stdin() {
        // Echo a match only if the live photo made it through
        let verifier = shell(
            r#"if grep -q 'data:image/jpeg;base64,AAAA'; then echo '{"isMatch": true, "confidence": 1}'; else echo '{"isMatch": false, "confidence": 0}'; fi"#,
        );

        let outcome = verifier.verify(&request()).await.unwrap();
        assert!(outcome.is_match);
    }

    #[tokio::test]
    async fn test_large_request_with_noisy_stderr() {
        // Fill well past a pipe buffer on stderr before reading stdin
        let verifier = shell(
            r#"head -c 262144 /dev/zero >&2; cat > /dev/null; echo '{"isMatch": true, "confidence": 0.7}'"#,
        );
        let payload = format!("data:image/jpeg;base64,{}", "A".repeat(1 << 20));
        let request = VerificationRequest {
            live_photo_data_uri: DataUri::parse(&payload).unwrap(),
            id_photo_data_uri: DataUri::parse(&payload).unwrap(),
        };

        let outcome = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            verifier.verify(&request),
        )
        .await
        .expect("verifier stalled")
        .unwrap();
        assert!(outcome.is_match);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        let verifier = shell("cat > /dev/null; echo boom >&2; exit 3");
        let result = verifier.verify(&request()).await;
        assert!(matches!(result, Err(AppError::VerificationFailed(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_an_error() {
        let verifier = shell(r#"cat > /dev/null; echo '{"isMatch": true, "confidence": 4.2}'"#);
        let result = verifier.verify(&request()).await;
        assert!(matches!(result, Err(AppError::VerificationFailed(_))));
    }
}
