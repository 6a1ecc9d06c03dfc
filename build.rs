fn main() {
    let date = std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|epoch| epoch.parse::<i64>().ok())
        .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(chrono::Utc::now);

    println!(
        "cargo:rustc-env=OUI_TEXTFILE_COLLECTOR_BUILD_DATE={}",
        date.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
