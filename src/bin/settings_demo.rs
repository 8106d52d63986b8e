use feedauth::settings::*;

// $ cargo run --bin settings_demo -- --settings=settings/dev.toml
// $ FEEDAUTH__STORE__BACKEND=redis cargo run --bin settings_demo
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;
    println!("{:#?}", settings);
    println!(
        "access lifetime {:?}, refresh lifetime {:?}",
        settings.auth.access_ttl(),
        settings.auth.refresh_ttl()
    );

    let missing = parse_settings(Some("settings/does-not-exist.toml"));
    println!("missing file rejected: {}", missing.is_err());
    Ok(())
}
