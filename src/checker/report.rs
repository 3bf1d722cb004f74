//! Progress and final-report formatting for a batch.

/// How one number came out of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Registered,
    Unregistered,
    /// The checker failed on this number; it was not cached.
    Error,
}

/// One classified number, in input order.
#[derive(Debug, Clone)]
pub struct CheckedNumber {
    pub number: String,
    pub verdict: Verdict,
    /// Served from the cache instead of a fresh check.
    pub cached: bool,
}

impl CheckedNumber {
    /// Numbers in the registered bucket; everything else (including errors)
    /// goes into the not-registered bucket.
    pub fn is_registered(&self) -> bool {
        matches!(self.verdict, Verdict::Registered)
    }

    fn line(&self) -> String {
        // "TerHIT" marks cache-derived results; the label split from fresh
        // checks is deliberate, not cosmetic.
        let status = match (self.verdict, self.cached) {
            (Verdict::Registered, true) => "✅ TerHIT",
            (Verdict::Registered, false) => "✅ Terdaftar",
            (Verdict::Unregistered, true) => "❌ TerHIT",
            (Verdict::Unregistered, false) => "❌ Tidak Terdaftar",
            (Verdict::Error, _) => "⚠️ Error",
        };
        format!("+{} --> {}", self.number, status)
    }
}

/// Text for the in-place progress message.
pub fn progress_text(checked: usize, total: usize) -> String {
    format!("🔍 Mengecek {total} nomor...\nProgres: {checked}/{total}")
}

/// Render the final HTML report: registered section first, then the
/// not-registered/error section. Input order is preserved within each
/// bucket and empty sections are omitted.
pub fn render_report(entries: &[CheckedNumber]) -> String {
    let registered: Vec<String> = entries
        .iter()
        .filter(|e| e.is_registered())
        .map(CheckedNumber::line)
        .collect();
    let unregistered: Vec<String> = entries
        .iter()
        .filter(|e| !e.is_registered())
        .map(CheckedNumber::line)
        .collect();

    let mut out = String::new();
    if !registered.is_empty() {
        out.push_str("✅ <b>Nomor Terdaftar:</b>\n");
        out.push_str(&registered.join("\n"));
        out.push_str("\n\n");
    }
    if !unregistered.is_empty() {
        out.push_str("❌ <b>Nomor Tidak Terdaftar:</b>\n");
        out.push_str(&unregistered.join("\n"));
        out.push_str("\n\n");
    }
    out.push_str("<i>by drixalexa</i>");
    out
}
