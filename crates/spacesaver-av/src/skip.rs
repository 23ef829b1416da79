//! Skip Oracle: decide whether a source is already optimal and should not be
//! re-encoded.

use crate::probe::ProbeInfo;

/// 1080p-equivalent bitrate (kbps) below which a source at the given CRF is
/// considered already optimal, interpolated between these anchor points.
const CRF_BITRATE_TABLE: &[(u8, u32)] = &[
    (16, 8000),
    (18, 5500),
    (20, 3800),
    (22, 2500),
    (24, 1700),
    (26, 1200),
    (28, 800),
];

const PIXELS_1080P: u64 = 1920 * 1080;

/// Verdict returned by `should_skip`: `Some(reason)` to skip, `None` to encode.
pub fn should_skip(probe: &ProbeInfo, crf: u8, res_cap: u32) -> Option<&'static str> {
    let max_height = probe.max_video_height();
    if res_cap > 0 && max_height > res_cap {
        return None;
    }

    if probe.is_hevc() {
        return Some("source already HEVC");
    }

    let source_kbps = probe.bit_rate.unwrap_or(0) / 1000;
    if source_kbps == 0 {
        return None;
    }

    let max_pixels = probe.max_video_pixels().max(1);
    let normalised_kbps = source_kbps * PIXELS_1080P / max_pixels;
    let threshold = crf_bitrate_threshold(crf);

    if normalised_kbps < u64::from(threshold) {
        return Some("source bitrate already below CRF threshold");
    }

    None
}

/// Interpolate (or clamp) the 1080p bitrate threshold for a given CRF.
fn crf_bitrate_threshold(crf: u8) -> u32 {
    if let Some(&(_, kbps)) = CRF_BITRATE_TABLE.iter().find(|(c, _)| *c == crf) {
        return kbps;
    }

    let first = CRF_BITRATE_TABLE.first().unwrap();
    let last = CRF_BITRATE_TABLE.last().unwrap();
    if crf <= first.0 {
        return first.1;
    }
    if crf >= last.0 {
        return last.1;
    }

    for window in CRF_BITRATE_TABLE.windows(2) {
        let (lo_crf, lo_kbps) = window[0];
        let (hi_crf, hi_kbps) = window[1];
        if crf >= lo_crf && crf <= hi_crf {
            let span = f64::from(hi_crf - lo_crf);
            let t = f64::from(crf - lo_crf) / span;
            let interpolated = f64::from(lo_kbps) + t * (f64::from(hi_kbps) - f64::from(lo_kbps));
            return interpolated.round() as u32;
        }
    }

    CRF_BITRATE_TABLE[CRF_BITRATE_TABLE.len() / 2].1
}
