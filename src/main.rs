use anyhow::Result;
use dotenvy::dotenv;

use outlinker::config;
use outlinker::runtime::modes::run_server;
use outlinker::system::init_logging;

#[actix_web::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // 配置必须先于日志系统加载（日志级别、输出目标来自配置）
    config::init_config();
    let config = config::get_config();

    // Guard 必须存活到进程退出，否则缓冲中的日志会丢失
    let _guard = init_logging(&config);

    run_server().await
}
