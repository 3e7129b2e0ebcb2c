// ==========================================
// 石材加工生产追踪系统 - 日志初始化
// ==========================================
// 工具: tracing + tracing-subscriber (EnvFilter)
// 级别经 RUST_LOG 覆盖，宿主亦可显式传入过滤器
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 缺省日志过滤器
const DEFAULT_FILTER: &str = "info";

/// 按指定过滤器初始化日志
///
/// RUST_LOG 存在时优先生效；宿主可传入如 "stone_mes=debug" 的显式过滤器
pub fn init_with_filter(filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化日志系统（缺省 info）
///
/// # 示例
/// ```no_run
/// use stone_mes::logging;
/// logging::init();
/// ```
pub fn init() {
    init_with_filter(DEFAULT_FILTER);
}

/// 初始化测试环境日志
///
/// 输出交给测试框架捕获；try_init 容忍同进程内重复初始化
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("stone_mes=debug"))
        .with_test_writer()
        .try_init();
}
