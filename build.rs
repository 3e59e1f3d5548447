use time::macros::format_description;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=TRIBVH_BUILD_STAMP");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    let stamp = std::env::var("TRIBVH_BUILD_STAMP")
        .ok()
        .or_else(|| build_time().map(format_utc))
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=TRIBVH_BUILD_STAMP={stamp}");
}

/// Honors `SOURCE_DATE_EPOCH` so reproducible builds embed a fixed stamp.
fn build_time() -> Option<OffsetDateTime> {
    match std::env::var("SOURCE_DATE_EPOCH") {
        Ok(secs) => {
            let secs: i64 = secs.trim().parse().ok()?;
            OffsetDateTime::from_unix_timestamp(secs).ok()
        }
        Err(_) => Some(OffsetDateTime::now_utc()),
    }
}

fn format_utc(t: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second] UTC");
    t.format(&fmt).unwrap_or_else(|_| "unknown".to_string())
}
