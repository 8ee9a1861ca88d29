use prepmate_session::utils::logging;
use prepmate_session::{
    visibility_channel, ApiClient, Config, ConsoleCandidate, NoDeviceCapture, SessionRunner,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    logging::init(config.verbose_logging);

    let api = ApiClient::new(config.api_base_url.clone());

    // 控制台环境没有可见性事件源，监考器保持静默
    let (_visibility_tx, proctor) = visibility_channel(config.warning_limit);

    let runner = SessionRunner::new(
        api,
        ConsoleCandidate::new(),
        NoDeviceCapture,
        proctor,
        config,
    );
    let report = runner.run().await?;

    tracing::info!("会话结束: {}", report.reason);
    Ok(())
}
