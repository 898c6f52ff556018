// ==========================================
// 建材价格解析引擎 - 应用层
// ==========================================
// 职责: 组装完整的计价服务，供宿主进程（采购/估价平台）嵌入
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
