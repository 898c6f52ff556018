// ==========================================
// 建材价格解析引擎 - 计价数据访问 Trait
// ==========================================
// 职责: 定义解析器依赖的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据读写
// 实现者: 各 *_repo.rs（使用 rusqlite）；测试中可替换为内存替身
// ==========================================

use crate::domain::material::{CommodityPrice, Material};
use crate::domain::price_revision::{NewPriceRevision, PriceRevision};
use crate::domain::tier_assignment::{TierAssignment, TierSetting};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;

// ==========================================
// TierAssignmentStore - 等级分配时间序列
// ==========================================
pub trait TierAssignmentStore: Send + Sync {
    /// 查询 as_of 当天命中窗口的全部候选
    ///
    /// # 返回
    /// - 按 effective_from DESC, id DESC 排序（首条即胜出者）
    fn find_effective(
        &self,
        customer_id: &str,
        category_code: i32,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>>;

    /// 查询客户在 as_of 当天命中窗口的全部记录
    ///
    /// # 返回
    /// - 按 category_code ASC, effective_from DESC, id DESC 排序
    fn find_effective_for_customer(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>>;

    /// 客户全部分配历史（category_code, effective_from, id 升序）
    fn list_for_customer(&self, customer_id: &str) -> RepositoryResult<Vec<TierAssignment>>;

    /// 原子替换客户等级
    ///
    /// # 说明
    /// - 同一事务内: 关闭客户全部未关闭分配（effective_until = effective_from）
    ///   再插入新分配（effective_from 起，无限期）
    /// - 任一步失败整体回滚
    ///
    /// # 返回
    /// - Ok((closed, inserted)): 关闭条数 / 插入条数
    fn replace_customer_tiers(
        &self,
        customer_id: &str,
        settings: &[TierSetting],
        effective_from: NaiveDate,
    ) -> RepositoryResult<(usize, usize)>;
}

// ==========================================
// PriceRevisionStore - 价格修订时间序列
// ==========================================
pub trait PriceRevisionStore: Send + Sync {
    /// 查询 as_of 当天命中窗口的全部候选
    ///
    /// # 返回
    /// - 按 effective_from DESC, revision_number DESC 排序（首条即胜出者）
    fn find_effective(
        &self,
        material_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<PriceRevision>>;

    /// 材料全部修订（revision_number 升序）
    fn list_for_material(&self, material_id: &str) -> RepositoryResult<Vec<PriceRevision>>;

    /// 追加修订
    ///
    /// # 说明
    /// - 同一事务内分配 revision_number = MAX + 1
    /// - close_open_prior=true 时同一事务内截断 effective_from ≤ 新修订 effective_from
    ///   且区间越过该日的修订（expires_at = 新 effective_from）；
    ///   已存在更晚修订时，新修订截止于下一条更晚修订的 effective_from
    fn append_revision(
        &self,
        revision: &NewPriceRevision,
        close_open_prior: bool,
    ) -> RepositoryResult<PriceRevision>;
}

// ==========================================
// MaterialStore - 材料主数据
// ==========================================
pub trait MaterialStore: Send + Sync {
    fn find_by_id(&self, material_id: &str) -> RepositoryResult<Option<Material>>;

    /// 插入或更新材料主数据
    fn upsert(&self, material: &Material) -> RepositoryResult<()>;
}

// ==========================================
// CommodityPriceStore - 大宗商品指数价
// ==========================================
pub trait CommodityPriceStore: Send + Sync {
    /// tag 下 effective_from ≤ as_of 的最新一条
    fn find_latest(&self, tag: &str, as_of: NaiveDate) -> RepositoryResult<Option<CommodityPrice>>;

    /// 追加一条指数价
    fn record(&self, tag: &str, price: f64, effective_from: NaiveDate) -> RepositoryResult<CommodityPrice>;
}

// ==========================================
// CustomerOverrideStore - 客户覆盖价
// ==========================================
pub trait CustomerOverrideStore: Send + Sync {
    /// 按唯一键查询覆盖价；行存在但价格为 NULL 时返回 Ok(None)
    fn find_price(&self, customer_id: &str, material_id: &str) -> RepositoryResult<Option<f64>>;

    fn set_override(&self, customer_id: &str, material_id: &str, price: f64) -> RepositoryResult<()>;

    /// 清除覆盖价（保留行，价格置空）
    fn clear_override(&self, customer_id: &str, material_id: &str) -> RepositoryResult<bool>;
}
