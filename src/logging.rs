// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 默认只放开本引擎的计价追溯，其他依赖保持 warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤器
pub const DEFAULT_LOG_FILTER: &str = "warn,materials_pricing=info";

/// 测试默认过滤器（引擎与仓储的 debug 级追溯）
const TEST_LOG_FILTER: &str = "warn,materials_pricing::engine=debug,materials_pricing::repository=debug";

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 覆盖默认过滤器
///   例如: RUST_LOG=materials_pricing::engine::effective_window=warn
///
/// # 示例
/// ```no_run
/// use materials_pricing::logging;
/// logging::init();
/// ```
pub fn init() {
    fmt()
        .with_env_filter(filter_or(DEFAULT_LOG_FILTER))
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// 初始化测试环境的日志系统（可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(filter_or(TEST_LOG_FILTER))
        .with_test_writer()
        .try_init();
}
