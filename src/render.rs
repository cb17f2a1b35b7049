//! Renders a [`BatchReport`] into a self-contained HTML document.
//!
//! The document is built in two steps: [`build_view`] computes everything
//! shown on the page (score, highlights, tallies) and [`render`] lays it out.
//! Only the footer depends on the render time, so two renders of the same
//! report agree on every other section byte for byte.

use crate::{
    config::Config,
    error::{QcError, QcResult},
    report::BatchReport,
    util::format_rfc3339,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use time::{
    OffsetDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    pub highlight_count: usize,
    pub name_truncate_chars: usize,
    pub tally_min_confidence: f64,
    pub tally_cap: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let r = crate::config::Render::default();
        Self {
            highlight_count: r.highlight_count,
            name_truncate_chars: r.name_truncate_chars,
            tally_min_confidence: r.tally_min_confidence,
            tally_cap: r.tally_cap,
        }
    }
}

impl RenderOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            highlight_count: cfg.render.highlight_count,
            name_truncate_chars: cfg.render.name_truncate_chars,
            tally_min_confidence: cfg.render.tally_min_confidence,
            tally_cap: cfg.render.tally_cap,
        }
    }
}

/// Display tier of the quality score. Informative only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreTier {
    Good,
    Warning,
    Critical,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::Good
        } else if score >= 70.0 {
            Self::Warning
        } else {
            Self::Critical
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Good => "#27ae60",
            Self::Warning => "#f39c12",
            Self::Critical => "#e74c3c",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub image_name: String,
    pub predicted_class: String,
    pub confidence_pct: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectTally {
    pub label: String,
    pub count: usize,
}

/// Everything the document shows, computed from the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportView {
    pub quality_score: f64,
    pub score_tier: ScoreTier,
    pub batch_id: String,
    pub category: String,
    pub tester_name: String,
    pub date: String,
    pub time: String,
    pub overall_quality: String,
    pub sheet_count: u32,
    pub batch_weight: f64,
    pub total_images_analyzed: usize,
    pub defects_found: usize,
    pub highlights: Vec<Highlight>,
    pub defect_tally: Vec<DefectTally>,
    pub recommendation: String,
}

impl ReportView {
    pub fn quality_score_display(&self) -> String {
        format!("{:.1}", self.quality_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub html: String,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub title: String,
    pub view: ReportView,
    pub sections: Vec<Section>,
    pub rendered_at: String,
    pub html: String,
}

impl RenderedDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.html.as_bytes()
    }
}

fn check_complete(report: &BatchReport) -> QcResult<()> {
    if report.batch_id.trim().is_empty() {
        return Err(QcError::Render("batch report has no batchId".into()));
    }
    if report.predictions.is_empty() {
        return Err(QcError::Render(format!(
            "batch report {} has no predictions",
            report.batch_id
        )));
    }
    if report.total_images_analyzed != report.predictions.len() {
        return Err(QcError::Render(format!(
            "batch report {} lists {} predictions but totalImagesAnalyzed={}",
            report.batch_id,
            report.predictions.len(),
            report.total_images_analyzed
        )));
    }
    Ok(())
}

pub fn build_view(report: &BatchReport, opts: &RenderOptions) -> QcResult<ReportView> {
    check_complete(report)?;

    let quality_score = (100.0 - report.defect_percentage()).max(0.0);
    let (date, time) = split_timestamp(&report.timestamp);

    let highlights = report
        .predictions
        .iter()
        .take(opts.highlight_count)
        .filter_map(|a| {
            // Ties keep the earlier entry.
            let top = a
                .predictions
                .iter()
                .reduce(|b, p| if p.confidence > b.confidence { p } else { b })?;
            Some(Highlight {
                image_name: truncate_name(&a.image_name, opts.name_truncate_chars),
                predicted_class: top.label.clone(),
                confidence_pct: format!("{:.1}%", top.confidence * 100.0),
            })
        })
        .collect();

    // First-seen order, capped; not ranked by frequency.
    let mut defect_tally: Vec<DefectTally> = Vec::new();
    for a in &report.predictions {
        if !a.defect_detected || a.confidence <= opts.tally_min_confidence {
            continue;
        }
        match defect_tally.iter_mut().find(|t| t.label == a.predicted_class) {
            Some(t) => t.count += 1,
            None => defect_tally.push(DefectTally {
                label: a.predicted_class.clone(),
                count: 1,
            }),
        }
    }
    defect_tally.truncate(opts.tally_cap);

    Ok(ReportView {
        quality_score,
        score_tier: ScoreTier::from_score(quality_score),
        batch_id: report.batch_id.clone(),
        category: report.category.clone(),
        tester_name: report.tester_name.clone(),
        date,
        time,
        overall_quality: report.overall_quality.as_str().to_string(),
        sheet_count: report.sheet_count,
        batch_weight: report.batch_weight,
        total_images_analyzed: report.total_images_analyzed,
        defects_found: report.defects_found,
        highlights,
        defect_tally,
        recommendation: report.recommended_action.clone(),
    })
}

pub fn render(
    report: &BatchReport,
    opts: &RenderOptions,
    rendered_at: OffsetDateTime,
) -> QcResult<RenderedDocument> {
    let view = build_view(report, opts)?;
    let title = format!("QC Test Report - {}", view.batch_id);
    let rendered_at = format_rfc3339(rendered_at);

    let sections = vec![
        Section {
            name: "header",
            html: header_html(&view),
        },
        Section {
            name: "metadata",
            html: metadata_html(&view),
        },
        Section {
            name: "summary",
            html: summary_html(&view),
        },
        Section {
            name: "highlights",
            html: highlights_html(&view),
        },
        Section {
            name: "defect_tally",
            html: tally_html(&view),
        },
        Section {
            name: "recommendation",
            html: recommendation_html(&view),
        },
        Section {
            name: "footer",
            html: footer_html(&rendered_at),
        },
    ];

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&title));
    let _ = writeln!(html, "<style>{}</style>", stylesheet(view.score_tier));
    html.push_str("</head>\n<body>\n<div class=\"report-container\">\n");
    for s in &sections {
        html.push_str(&s.html);
    }
    html.push_str("</div>\n</body>\n</html>\n");

    Ok(RenderedDocument {
        title,
        view,
        sections,
        rendered_at,
        html,
    })
}

pub fn render_now(report: &BatchReport, opts: &RenderOptions) -> QcResult<RenderedDocument> {
    render(report, opts, OffsetDateTime::now_utc())
}

fn header_html(v: &ReportView) -> String {
    format!(
        "<div class=\"header\">\n\
         <div class=\"title-section\"><h1 class=\"main-title\">Quality Control Test Report</h1>\
         <p class=\"subtitle\">RSS Rubber Sheet Inspection Analysis</p></div>\n\
         <div class=\"quality-score\"><div class=\"score-value\">{}%</div>\
         <div class=\"score-label\">Quality Score</div></div>\n</div>\n",
        v.quality_score_display()
    )
}

fn metadata_html(v: &ReportView) -> String {
    let mut s = String::from("<div class=\"meta-grid\">\n");
    for (label, value) in [
        ("Batch ID", v.batch_id.as_str()),
        ("Category", v.category.as_str()),
        ("Tester", v.tester_name.as_str()),
        ("Test Date", v.date.as_str()),
        ("Test Time", v.time.as_str()),
        ("Overall Quality", v.overall_quality.as_str()),
    ] {
        let _ = writeln!(
            s,
            "<div class=\"meta-item\"><div class=\"meta-label\">{label}</div><div class=\"meta-value\">{}</div></div>",
            escape_html(or_na(value))
        );
    }
    s.push_str("</div>\n");
    s
}

fn summary_html(v: &ReportView) -> String {
    let mut s = String::from("<div class=\"summary-grid\">\n");
    for (label, value) in [
        ("Total Sheets", v.sheet_count.to_string()),
        ("Weight (kg)", v.batch_weight.to_string()),
        ("Images Analyzed", v.total_images_analyzed.to_string()),
        ("Defects Found", v.defects_found.to_string()),
    ] {
        let _ = writeln!(
            s,
            "<div class=\"summary-item\"><div class=\"summary-value\">{value}</div><div class=\"summary-label\">{label}</div></div>"
        );
    }
    s.push_str("</div>\n");
    s
}

fn highlights_html(v: &ReportView) -> String {
    let mut s = String::from(
        "<div class=\"column\"><h3 class=\"column-title\">Image Analysis Summary</h3>\n",
    );
    if v.highlights.is_empty() {
        s.push_str("<div class=\"empty\">No image analysis data available</div>\n");
    }
    for h in &v.highlights {
        let _ = writeln!(
            s,
            "<div class=\"image-summary\"><div class=\"image-name\">{}</div>\
             <div class=\"prediction-detail\"><span class=\"defect-type\">{}</span>\
             <span class=\"confidence\">{}</span></div></div>",
            escape_html(&h.image_name),
            escape_html(&h.predicted_class),
            h.confidence_pct
        );
    }
    s.push_str("</div>\n");
    s
}

fn tally_html(v: &ReportView) -> String {
    let mut s =
        String::from("<div class=\"column\"><h3 class=\"column-title\">Top Defect Types</h3>\n");
    if v.defect_tally.is_empty() {
        s.push_str("<div class=\"empty\">No defect data available</div>\n");
    }
    for t in &v.defect_tally {
        let plural = if t.count == 1 { "" } else { "s" };
        let _ = writeln!(
            s,
            "<div class=\"defect-item\"><span class=\"defect-name\">{}</span>\
             <span class=\"defect-count\">{} occurrence{plural}</span></div>",
            escape_html(&t.label),
            t.count
        );
    }
    s.push_str("</div>\n");
    s
}

fn recommendation_html(v: &ReportView) -> String {
    let text = if v.recommendation.trim().is_empty() {
        "No specific recommendations available for this test."
    } else {
        v.recommendation.as_str()
    };
    format!(
        "<div class=\"recommendation-box\"><h4 class=\"rec-title\">Quality Recommendation</h4>\
         <p class=\"rec-text\">{}</p></div>\n",
        escape_html(text)
    )
}

fn footer_html(rendered_at: &str) -> String {
    format!(
        "<div class=\"footer\"><p>Report generated on {rendered_at} &bull; Quality Control System v1.0</p>\
         <p>This report is system-generated. For detailed analysis, contact quality control department.</p></div>\n"
    )
}

fn stylesheet(tier: ScoreTier) -> String {
    let color = tier.color();
    format!(
        "@page {{ margin: 20px; size: A4 portrait; }} \
         body {{ font-family: 'Segoe UI', Tahoma, sans-serif; color: #2c3e50; font-size: 11px; }} \
         .header {{ display: flex; justify-content: space-between; border-bottom: 2px solid #3498db; }} \
         .quality-score {{ border-left: 4px solid {color}; padding: 10px 15px; }} \
         .score-value {{ font-size: 24px; font-weight: bold; color: {color}; }} \
         .meta-grid {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 12px; }} \
         .summary-grid {{ display: grid; grid-template-columns: repeat(4, 1fr); gap: 12px; }} \
         .column {{ background-color: #f8f9fa; padding: 15px; border-radius: 8px; }} \
         .defect-count {{ color: #dc3545; font-weight: 600; }} \
         .recommendation-box {{ background-color: #fff3cd; border-left: 4px solid #f39c12; padding: 15px; }} \
         .footer {{ text-align: center; color: #6c757d; font-size: 9px; }}"
    )
}

fn or_na(s: &str) -> &str {
    if s.trim().is_empty() { "N/A" } else { s }
}

pub fn truncate_name(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Splits an RFC 3339 timestamp into UTC `YYYY-MM-DD` and `HH:MM:SS`.
pub fn split_timestamp(raw: &str) -> (String, String) {
    let date_fmt = format_description!("[year]-[month]-[day]");
    let time_fmt = format_description!("[hour]:[minute]:[second]");
    match OffsetDateTime::parse(raw, &Rfc3339) {
        Ok(t) => {
            let t = t.to_offset(UtcOffset::UTC);
            (
                t.format(&date_fmt).unwrap_or_else(|_| raw.to_string()),
                t.format(&time_fmt).unwrap_or_else(|_| "N/A".to_string()),
            )
        }
        Err(_) => (raw.to_string(), "N/A".to_string()),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
