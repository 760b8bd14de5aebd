mod common;

use anyhow::Result;
use chitbook::application::{AppError, IdentityVerifier, LedgerConfig, VerifierConfig};
use chitbook::domain::{DataUri, VerificationOutcome, VerificationRequest};
use common::{test_service, test_service_with};

/// Verifier that always answers with the same verdict
struct FixedVerifier(Result<VerificationOutcome, String>);

impl IdentityVerifier for FixedVerifier {
    async fn verify(&self, _request: &VerificationRequest) -> Result<VerificationOutcome, AppError> {
        self.0.clone().map_err(AppError::VerificationFailed)
    }
}

fn outcome(is_match: bool, confidence: f64) -> VerificationOutcome {
    VerificationOutcome {
        is_match,
        confidence,
        reason: None,
    }
}

fn request() -> Result<VerificationRequest> {
    Ok(VerificationRequest {
        live_photo_data_uri: DataUri::parse("data:image/png;base64,iVBORw0KGgo=")?,
        id_photo_data_uri: DataUri::parse("data:image/jpeg;base64,/9j/4AAQ")?,
    })
}

fn strict_config(min_confidence: f64) -> LedgerConfig {
    LedgerConfig {
        verifier: Some(VerifierConfig {
            command: "face-match".to_string(),
            args: Vec::new(),
            min_confidence,
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_match_passes_without_threshold() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let verifier = FixedVerifier(Ok(outcome(true, 0.1)));
    let result = service.confirm_identity(&verifier, &request()?).await?;
    assert!(result.is_match);

    Ok(())
}

#[tokio::test]
async fn test_mismatch_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let verifier = FixedVerifier(Ok(VerificationOutcome {
        is_match: false,
        confidence: 0.95,
        reason: Some("different person".to_string()),
    }));
    let result = service.confirm_identity(&verifier, &request()?).await;

    match result {
        Err(AppError::IdentityMismatch { reason, .. }) => {
            assert_eq!(reason.as_deref(), Some("different person"));
        }
        other => panic!("expected mismatch, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn test_threshold_gates_low_confidence() -> Result<()> {
    let (service, _temp) = test_service_with(strict_config(0.8)).await?;

    let weak = FixedVerifier(Ok(outcome(true, 0.79)));
    let result = service.confirm_identity(&weak, &request()?).await;
    assert!(matches!(
        result,
        Err(AppError::IdentityMismatch { required, .. }) if required == 0.8
    ));

    let strong = FixedVerifier(Ok(outcome(true, 0.8)));
    let result = service.confirm_identity(&strong, &request()?).await?;
    assert_eq!(result.confidence, 0.8);

    Ok(())
}

#[tokio::test]
async fn test_verifier_errors_propagate() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let broken = FixedVerifier(Err("service unavailable".to_string()));
    let result = service.confirm_identity(&broken, &request()?).await;
    assert!(matches!(result, Err(AppError::VerificationFailed(_))));

    Ok(())
}
