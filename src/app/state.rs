// ==========================================
// 生产批次核算系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{BatchApi, DashboardApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version};
use crate::repository::{ActionLogRepository, BatchRepository, SupplierRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共享同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 批次API
    pub batch_api: Arc<BatchApi>,

    /// 经营看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保 schema 存在
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库schema: {}", e))?;
        match read_schema_version(&conn) {
            Ok(v) => tracing::debug!(schema_version = ?v, "数据库schema就绪"),
            Err(e) => tracing::warn!(error = %e, "读取schema_version失败"),
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let batch_repo = Arc::new(BatchRepository::new(conn.clone()));
        let supplier_repo = Arc::new(SupplierRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?
        );

        // ==========================================
        // 创建API实例
        // ==========================================
        let batch_api = Arc::new(BatchApi::new(
            batch_repo.clone(),
            supplier_repo,
            action_log_repo,
            config_manager.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(batch_repo, config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            batch_api,
            dashboard_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 FOOD_PRODUCTION_OPS_DB_PATH（非空时）
/// - 否则: 用户数据目录/food-production-ops/food_production_ops.db
/// - 无法获取用户数据目录时: ./food_production_ops.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("FOOD_PRODUCTION_OPS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./food_production_ops.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("food-production-ops");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("food_production_ops.db");
        }
    }

    path.to_string_lossy().to_string()
}
