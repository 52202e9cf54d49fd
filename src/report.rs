//! Console rendering of live samples and run statistics.

use std::fmt::Write;

use crate::data::{FieldSet, Sample, Summary};

const RULE_WIDTH: usize = 50;

/// Render the live view for one sample.
///
/// [`FieldSet::Basic`] prints a single line; [`FieldSet::Extended`] adds
/// signal strength, quality and modulation lines.
pub fn format_live(sample: &Sample, ue_id: u32, fields: FieldSet) -> String {
    let time = sample.timestamp.format("%H:%M:%S");
    let rates = format!(
        "Instant Rate: {:.2} Mbps, Avg Rate: {:.2} Mbps, Total DL: {:.2} MB",
        sample.instant_rate_mbps,
        sample.avg_rate_mbps,
        sample.total_megabytes()
    );

    let enrichment = match (fields, sample.enrichment) {
        (FieldSet::Extended, Some(e)) => e,
        _ => return format!("{}: UE[{}] {}", time, ue_id, rates),
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}: UE[{}]", time, ue_id);
    let _ = writeln!(out, "  {}", rates);
    let _ = writeln!(
        out,
        "  Signal Strength: EPRE={:.1}dBm, Path Loss={:.1}dB, P_UE={:.1}dBm",
        enrichment.epre, enrichment.ul_path_loss, enrichment.p_ue
    );
    let _ = writeln!(
        out,
        "  Signal Quality: PUCCH SNR={:.1}dB, PUSCH SNR={:.1}dB, CQI={:.0}",
        enrichment.pucch1_snr, enrichment.pusch_snr, enrichment.cqi
    );
    let _ = writeln!(
        out,
        "  Modulation Coding: DL MCS={:.1}, UL MCS={:.0}, UL Layers={:.0}",
        enrichment.dl_mcs, enrichment.ul_mcs, enrichment.ul_n_layer
    );
    let _ = write!(out, "  {}", "-".repeat(RULE_WIDTH));
    out
}

/// Render the end-of-run statistics block.
pub fn format_summary(summary: &Summary, ue_id: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Statistics for UE[{}]:", ue_id);
    let _ = writeln!(out, "Average Rate: {:.2} Mbps", summary.mean_rate_mbps);
    let _ = writeln!(out, "Max Rate: {:.2} Mbps", summary.max_rate_mbps);
    let _ = writeln!(out, "Min Rate: {:.2} Mbps", summary.min_rate_mbps);
    let _ = write!(out, "Total Data: {:.2} MB", summary.total_megabytes);

    if let Some(means) = summary.mean_enrichment {
        let _ = writeln!(out);
        let _ = writeln!(out);
        let _ = writeln!(out, "Signal Statistics:");
        let _ = writeln!(out, "Average EPRE: {:.1}dBm", means.epre);
        let _ = writeln!(out, "Average Path Loss: {:.1}dB", means.ul_path_loss);
        let _ = writeln!(out, "Average P_UE: {:.1}dBm", means.p_ue);
        let _ = writeln!(out, "Average PUCCH SNR: {:.1}dB", means.pucch1_snr);
        let _ = writeln!(out, "Average PUSCH SNR: {:.1}dB", means.pusch_snr);
        let _ = writeln!(out, "Average CQI: {:.1}", means.cqi);
        let _ = writeln!(out, "Average DL MCS: {:.1}", means.dl_mcs);
        let _ = writeln!(out, "Average UL MCS: {:.1}", means.ul_mcs);
        let _ = write!(out, "Average UL Layers: {:.1}", means.ul_n_layer);
    }
    out
}
