use crate::{
    aggregate,
    assess::Assessor,
    classifier::Classifier,
    config::Config,
    error::{QcError, QcResult},
    report::{BatchMetadata, BatchReport, SampleAssessment},
    request::{BatchRequest, CallerIdentity, ImagePayload},
    status,
};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Classify → assess → aggregate for one batch submission.
pub struct Pipeline<C: Classifier> {
    cfg: Config,
    classifier: C,
    assessor: Assessor,
}

impl<C: Classifier> Pipeline<C> {
    pub fn new(cfg: &Config, classifier: C) -> Self {
        let assessor = Assessor::from_config(cfg, classifier.labels().clone());
        Self {
            cfg: cfg.clone(),
            classifier,
            assessor,
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Validates and decodes a client request, then runs the batch.
    pub fn run_batch(&self, req: &BatchRequest, caller: &CallerIdentity) -> QcResult<BatchReport> {
        req.validate()?;

        if self.cfg.classifier.require_model_asset && !status::model_asset_present(&self.cfg) {
            return Err(QcError::ModelMissing(format!(
                "ML model not found at {}",
                self.cfg.paths.model_path
            )));
        }

        let images = req.decode_images()?;
        info!(
            caller = caller.as_str(),
            batch_id = %req.batch_id,
            images = images.len(),
            "prediction request"
        );
        self.run_decoded(req.metadata(), &images)
    }

    /// Runs already-decoded images. Any failing image fails the whole batch.
    pub fn run_decoded(&self, meta: BatchMetadata, images: &[ImagePayload]) -> QcResult<BatchReport> {
        let started = Instant::now();
        let assessments = self.assess_images(images)?;
        let report = aggregate::aggregate(meta, assessments)?;

        info!(
            batch_id = %report.batch_id,
            total = report.total_images_analyzed,
            defects = report.defects_found,
            verdict = report.overall_quality.as_str(),
            highest_severity = ?report.highest_severity(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch assessed"
        );
        Ok(report)
    }

    pub fn assess_images(&self, images: &[ImagePayload]) -> QcResult<Vec<SampleAssessment>> {
        let mut out = Vec::with_capacity(images.len());
        for img in images {
            let classification = self
                .classifier
                .classify(&img.name, &img.bytes)
                .inspect_err(|e| warn!("classification failed for {}: {e}", img.name))?;
            let assessment = self.assessor.assess(&classification)?;
            debug!(
                image = %assessment.image_name,
                class = %assessment.predicted_class,
                confidence = assessment.confidence,
                severity = ?assessment.severity,
                "sample assessed"
            );
            out.push(assessment);
        }
        Ok(out)
    }
}
