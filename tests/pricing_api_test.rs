// ==========================================
// PricingApi 集成测试
// ==========================================
// 测试目标: 输入解析（日期/等级标签）、错误映射、配置更新
// ==========================================


use materials_pricing::api::{ApiError, TierSettingInput};
use materials_pricing::domain::{BatchItemRequest, Material, TierPrices};
use materials_pricing::{AppState, CalculationMethod, Tier};
use test_helpers::{create_test_db, date, new_revision};

const CUSTOMER: &str = "C-5005";

fn setup_state() -> (tempfile::NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let state = AppState::new(db_path).expect("初始化AppState失败");
    (temp_file, state)
}

fn seed(state: &AppState) {
    let api = &state.pricing_api;
    api.upsert_material(&Material::new("M-2X4", "SKU-2X4", Some(2)).with_vendor_cost(30.0))
        .unwrap();
    api.set_customer_tiers(CUSTOMER, &[TierSettingInput::new(2, "09")], "2024-01-01")
        .unwrap();
    api.create_price_revision(&new_revision(
        "M-2X4",
        TierPrices::new().with(Tier::from_str("09").unwrap(), 45.50),
        date(2024, 1, 1),
    ))
    .unwrap();
}

#[test]
fn test_calculate_price_with_iso_date() {
    let (_tmp, state) = setup_state();
    seed(&state);

    let calc = state
        .pricing_api
        .calculate_price(CUSTOMER, "M-2X4", 4.0, Some("2024-06-01"))
        .unwrap();
    assert_eq!(calc.final_price, 45.50);
    assert_eq!(calc.calculation_method, CalculationMethod::TierBased);
    assert_eq!(calc.as_of, date(2024, 6, 1));

    let breakdown = state
        .pricing_api
        .calculate_breakdown(CUSTOMER, "M-2X4", 4.0, Some(0.0), Some("2024-06-01"))
        .unwrap();
    assert_eq!(breakdown.totals.total, 182.0);

    // 未指定日期时按当天计价（等级与修订均无限期有效）
    let today = state
        .pricing_api
        .calculate_price(CUSTOMER, "M-2X4", 1.0, None)
        .unwrap();
    assert_eq!(today.final_price, 45.50);
}

#[test]
fn test_unpriceable_maps_to_not_found() {
    let (_tmp, state) = setup_state();
    seed(&state);

    let err = state
        .pricing_api
        .calculate_price("C-NOBODY", "M-2X4", 1.0, Some("2024-06-01"))
        .unwrap_err();
    assert!(err.is_not_found());

    let err = state
        .pricing_api
        .calculate_price(CUSTOMER, "M-MISSING", 1.0, Some("2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    let err = state.pricing_api.get_material("M-MISSING").unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_invalid_input_is_rejected() {
    let (_tmp, state) = setup_state();
    seed(&state);
    let api = &state.pricing_api;

    let err = api
        .calculate_price(CUSTOMER, "M-2X4", 1.0, Some("06/01/2024"))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api
        .calculate_price(CUSTOMER, "M-2X4", -2.0, Some("2024-06-01"))
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api.calculate_price("", "M-2X4", 1.0, None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api
        .set_customer_tiers(CUSTOMER, &[TierSettingInput::new(2, "9")], "2024-02-01")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api
        .set_customer_tiers(CUSTOMER, &[TierSettingInput::new(2, "05")], "")
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    // 非法请求没有改变等级
    let tiers = api.get_customer_tiers(CUSTOMER, Some("2024-06-01")).unwrap();
    assert_eq!(tiers.len(), 1);
    assert_eq!(tiers[0].record.tier, Tier::from_str("09").unwrap());
}

#[test]
fn test_override_and_commodity_via_api() {
    let (_tmp, state) = setup_state();
    let api = &state.pricing_api;

    api.upsert_material(
        &Material::new("M-SPF", "SKU-SPF", Some(15)).with_commodity("SPF_2X4", Some(400.0)),
    )
    .unwrap();
    api.set_customer_tiers(CUSTOMER, &[TierSettingInput::new(15, "L5")], "2024-01-01")
        .unwrap();
    api.record_commodity_price("SPF_2X4", 512.0, "2024-05-01").unwrap();

    let calc = api
        .calculate_price(CUSTOMER, "M-SPF", 1.0, Some("2024-06-01"))
        .unwrap();
    assert_eq!(calc.calculation_method, CalculationMethod::RandomLengths);
    assert_eq!(calc.final_price, 512.0);

    api.set_customer_override(CUSTOMER, "M-SPF", 450.0).unwrap();
    assert_eq!(api.get_customer_override(CUSTOMER, "M-SPF").unwrap(), Some(450.0));
    let calc = api
        .calculate_price(CUSTOMER, "M-SPF", 1.0, Some("2024-06-01"))
        .unwrap();
    assert_eq!(calc.calculation_method, CalculationMethod::Override);

    assert!(api.clear_customer_override(CUSTOMER, "M-SPF").unwrap());
    assert!(!api.clear_customer_override(CUSTOMER, "M-OTHER").unwrap());

    let err = api.set_customer_override(CUSTOMER, "M-SPF", -1.0).unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[test]
fn test_batch_via_api() {
    let (_tmp, state) = setup_state();
    seed(&state);

    let items = vec![
        BatchItemRequest::new("M-2X4", 2.0, None),
        BatchItemRequest::new("M-MISSING", 1.0, None),
    ];
    let result = state
        .pricing_api
        .calculate_batch(CUSTOMER, &items, Some("2024-06-01"))
        .unwrap();
    assert_eq!(result.success_count, 1);
    assert_eq!(result.failed_count, 1);
    assert_eq!(result.total_amount, 91.0);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["failed"][0]["failure"]["kind"], "UNPRICEABLE");
    assert_eq!(json["failed"][0]["failure"]["reason"], "NO_CATEGORY");
}

#[test]
fn test_config_update_and_audit() {
    let (_tmp, state) = setup_state();
    seed(&state);
    let api = &state.pricing_api;

    api.update_config("pricing/default_waste_factor_pct", "5").unwrap();
    api.update_config("pricing/revision_auto_close", "false").unwrap();
    let config = api.get_pricing_config().unwrap();
    assert_eq!(config.default_waste_factor_pct, 5.0);
    assert!(!config.revision_auto_close);

    let snapshot = api.get_config_snapshot().unwrap();
    assert!(snapshot.contains("pricing/default_waste_factor_pct"));

    assert!(matches!(
        api.update_config("pricing/max_batch_items", "0"),
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_config("pricing/unknown", "1"),
        Err(ApiError::InvalidInput(_))
    ));

    // 关闭自动关闭后，新修订与旧修订重叠，审计可见
    api.create_price_revision(&new_revision(
        "M-2X4",
        TierPrices::new().with(Tier::from_str("09").unwrap(), 47.0),
        date(2024, 3, 1),
    ))
    .unwrap();
    assert_eq!(api.audit_material_revisions("M-2X4").unwrap().len(), 1);
    assert!(api.audit_customer_tiers(CUSTOMER).unwrap().is_empty());
    assert_eq!(api.get_revision_history("M-2X4").unwrap().len(), 2);
}
