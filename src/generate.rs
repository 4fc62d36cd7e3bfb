//! Generation orchestration.
//!
//! `ReportGenerator` abstracts where report text comes from: the built-in
//! deterministic template or a remote model endpoint. `generate_report`
//! drives one request through the store lifecycle: admission gate, input
//! aggregation, generator run, success or error dispatch.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::pipeline::{aggregate, has_data_to_generate};
use crate::report::synthesize;
use crate::state::{Action, Store};
use crate::types::{GeneratedReport, NormalizedInput, ReportSource};

#[async_trait]
pub trait ReportGenerator: Send + Sync {
    async fn generate(&self, input: &NormalizedInput) -> Result<String>;
}

/// The deterministic generator, with optional simulated latency to mimic a
/// remote model round trip.
#[derive(Debug, Default)]
pub struct TemplateGenerator {
    latency: Option<Duration>,
}

impl TemplateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
        }
    }
}

#[async_trait]
impl ReportGenerator for TemplateGenerator {
    async fn generate(&self, input: &NormalizedInput) -> Result<String> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(synthesize(input))
    }
}

/// Generator backed by a remote model endpoint: POSTs the normalized input
/// as JSON and expects `{"content": "..."}` back. Every failure mode maps to
/// `Error::Generation` so the store records one message and keeps the prior
/// report visible.
pub struct RemoteGenerator {
    http: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    content: String,
}

impl RemoteGenerator {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ReportGenerator for RemoteGenerator {
    async fn generate(&self, input: &NormalizedInput) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(input)
            .send()
            .await
            .map_err(|e| Error::Generation(format!("report service unreachable: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Generation(format!(
                "report service returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Generation(format!("malformed report service response: {}", e)))?;
        Ok(body.content)
    }
}

/// Run one generation request through the store.
///
/// `is_generating` is a single-slot admission gate: a second request is
/// rejected while one is outstanding. The data gate rejects before any state
/// transition, so a refused request leaves the store untouched.
pub async fn generate_report(
    store: &mut Store,
    generator: &dyn ReportGenerator,
) -> Result<GeneratedReport> {
    if store.state().is_generating {
        return Err(Error::Generation(
            "a report generation is already in progress".to_string(),
        ));
    }
    if !has_data_to_generate(store.state()) {
        return Err(Error::Validation(
            "add a daily record, connect a tracker, or upload a file first".to_string(),
        ));
    }

    store.dispatch(Action::StartGeneration);
    let snapshot = store.snapshot();
    let input = aggregate(&snapshot);

    match generator.generate(&input).await {
        Ok(content) => {
            let source = ReportSource {
                daily_record: input.data_sources.has_daily_records,
                tracker_platform: snapshot
                    .user_input
                    .connection
                    .platform
                    .map(|p| p.as_str().to_string()),
                file_uploaded: snapshot.user_input.file_upload.uploaded,
            };
            let report = GeneratedReport::new(content, source);
            store.dispatch(Action::GenerationSuccess(report.clone()));
            log::info!(
                "Generated report {} ({} chars)",
                report.id,
                report.content.len()
            );
            Ok(report)
        }
        Err(err) => {
            log::warn!("Report generation failed: {}", err);
            store.dispatch(Action::GenerationError(err.user_message()));
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::types::{DailyRecordEntry, ReportStatus};

    struct FailingGenerator;

    #[async_trait]
    impl ReportGenerator for FailingGenerator {
        async fn generate(&self, _input: &NormalizedInput) -> Result<String> {
            Err(Error::Generation("model offline".to_string()))
        }
    }

    fn store_with_record() -> Store {
        let mut store = Store::default();
        store.dispatch(Action::AddDailyRecord(DailyRecordEntry::new(
            "2025-01-02",
            "wrote the importer",
        )));
        store
    }

    #[tokio::test]
    async fn test_generate_report_happy_path() {
        let mut store = store_with_record();
        let generator = TemplateGenerator::new();

        let report = generate_report(&mut store, &generator).await.unwrap();

        assert!(report.content.starts_with("## Self-Assessment Report"));
        assert!(report.content.contains("- Record 1: wrote the importer"));
        assert!(report.source.daily_record);
        assert!(report.source.tracker_platform.is_none());
        assert!(matches!(report.status, ReportStatus::Draft));

        let state = store.state();
        assert!(!state.is_generating);
        assert!(state.error.is_none());
        assert_eq!(state.generated_reports.len(), 1);
        assert_eq!(
            state.current_report.as_ref().map(|r| r.id.as_str()),
            Some(report.id.as_str())
        );
    }

    #[tokio::test]
    async fn test_rejected_without_data_and_store_untouched() {
        let mut store = Store::default();
        let generator = TemplateGenerator::new();

        let err = generate_report(&mut store, &generator).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(!store.state().is_generating);
        assert!(store.state().error.is_none());
        assert!(store.state().generated_reports.is_empty());
    }

    #[tokio::test]
    async fn test_admission_gate_rejects_second_request() {
        let mut store = store_with_record();
        store.dispatch(Action::StartGeneration);

        let generator = TemplateGenerator::new();
        let err = generate_report(&mut store, &generator).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        // The outstanding request's flag is not clobbered.
        assert!(store.state().is_generating);
    }

    #[tokio::test]
    async fn test_failing_generator_records_message_and_keeps_prior_report() {
        let mut store = store_with_record();
        let first = generate_report(&mut store, &TemplateGenerator::new())
            .await
            .unwrap();

        let err = generate_report(&mut store, &FailingGenerator).await.unwrap_err();
        assert!(matches!(err, Error::Generation(_)));

        let state = store.state();
        assert!(!state.is_generating);
        assert_eq!(state.error.as_deref(), Some("model offline"));
        assert_eq!(
            state.current_report.as_ref().map(|r| r.id.as_str()),
            Some(first.id.as_str())
        );
        assert_eq!(state.generated_reports.len(), 1);
    }

    #[tokio::test]
    async fn test_source_flags_reflect_snapshot() {
        let mut store = store_with_record();
        store.dispatch(Action::SetPlatform(Some(
            crate::trackers::TrackerPlatform::Jira,
        )));
        let data = serde_json::from_str(
            r#"{"user": {"id": "u1"}, "projects": [], "issues": []}"#,
        )
        .unwrap();
        store.dispatch(Action::ConnectApiSuccess(data));

        let report = generate_report(&mut store, &TemplateGenerator::new())
            .await
            .unwrap();
        assert_eq!(report.source.tracker_platform.as_deref(), Some("jira"));
        assert!(report.source.daily_record);
        assert!(!report.source.file_uploaded);
    }

    #[tokio::test]
    async fn test_template_generator_simulated_latency() {
        let mut state = AppState::default();
        state
            .user_input
            .daily_records
            .insert("2025-01-02".into(), "a".into());
        let input = aggregate(&state);

        let generator = TemplateGenerator::with_latency(Duration::from_millis(20));
        let started = std::time::Instant::now();
        let content = generator.generate(&input).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert!(content.starts_with("## Self-Assessment Report"));
    }

    #[test]
    fn test_generate_response_shape() {
        let body: GenerateResponse =
            serde_json::from_str(r###"{"content": "## Self-Assessment Report"}"###).unwrap();
        assert_eq!(body.content, "## Self-Assessment Report");
    }
}
