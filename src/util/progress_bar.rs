
use indicatif::{ProgressState, ProgressStyle};

/// Shared progress bar styling for the per-sample loops; the bar message carries the phase label
pub fn get_progress_style() -> ProgressStyle {
    ProgressStyle::with_template("[{elapsed_precise}] {msg:<20} {bar:40.cyan/blue} {pos}/{len} ({percent}); ETA: {eta_precise}")
        .unwrap()
        .with_key("percent", |state: &ProgressState, w: &mut dyn std::fmt::Write| write!(w, "{:.1}%", state.fraction()*100.0).unwrap())
        .progress_chars("##-")
}
