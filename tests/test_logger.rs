use confsource::basic::logger::ConfLogger;
use confsource::basic::result::ConfResult;

#[test]
fn test_logger_keeps_installed_subscriber() -> ConfResult<()> {
    assert!(tracing_subscriber::fmt().with_test_writer().try_init().is_ok());
    ConfLogger::init()?;
    ConfLogger::init()?;
    tracing::info!("[ConfSource.Logger] still logging");
    Ok(())
}
