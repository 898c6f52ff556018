// ==========================================
// 价格修订集成测试
// ==========================================
// 测试目标: 修订号分配、自动关闭、重叠选择与告警、写入校验
// ==========================================


use materials_pricing::domain::{IntegrityViolationKind, TierPrices};
use materials_pricing::repository::RepositoryError;
use materials_pricing::Tier;
use test_helpers::{date, new_revision, seed_material, setup_env};

const MATERIAL: &str = "M-OSB";

fn prices(label: &str, price: f64) -> TierPrices {
    TierPrices::new().with(Tier::from_str(label).unwrap(), price)
}

#[test]
fn test_revision_numbering_and_auto_close() {
    let env = setup_env();
    seed_material(&env.repos, MATERIAL, 4);
    let resolver = env.orchestrator.revision_resolver();

    let rev1 = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 20.0), date(2024, 1, 1)))
        .unwrap();
    let rev2 = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 22.0), date(2024, 4, 1)))
        .unwrap();
    assert_eq!(rev1.revision_number, 1);
    assert_eq!(rev2.revision_number, 2);

    let history = resolver.history(MATERIAL).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].expires_at, Some(date(2024, 4, 1)));
    assert_eq!(history[1].expires_at, None);

    let march = resolver.resolve(MATERIAL, date(2024, 3, 31)).unwrap().unwrap();
    assert_eq!(march.record.revision_number, 1);

    let handoff = resolver.resolve(MATERIAL, date(2024, 4, 1)).unwrap().unwrap();
    assert_eq!(handoff.record.revision_number, 2);
    assert!(!handoff.has_integrity_warning());

    let tier = Tier::from_str("03").unwrap();
    assert_eq!(
        resolver.price_for_tier(MATERIAL, tier, date(2024, 5, 1)).unwrap(),
        Some(22.0)
    );
    assert_eq!(
        resolver.price_for_tier(MATERIAL, tier, date(2023, 12, 31)).unwrap(),
        None
    );
    assert!(resolver.audit_overlaps(MATERIAL).unwrap().is_empty());
}

#[test]
fn test_backdated_revision_is_capped_at_next_revision() {
    let env = setup_env();
    seed_material(&env.repos, MATERIAL, 4);
    let resolver = env.orchestrator.revision_resolver();

    let june = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 22.0), date(2024, 6, 1)))
        .unwrap();
    let january = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 20.0), date(2024, 1, 1)))
        .unwrap();
    assert_eq!(january.expires_at, Some(date(2024, 6, 1)));

    let history = resolver.history(MATERIAL).unwrap();
    assert_eq!(history[0].expires_at, None);
    assert_eq!(history[1].expires_at, Some(date(2024, 6, 1)));
    assert!(resolver.audit_overlaps(MATERIAL).unwrap().is_empty());

    let july = resolver.resolve(MATERIAL, date(2024, 7, 1)).unwrap().unwrap();
    assert_eq!(july.record.id, june.id);
    assert!(!july.has_integrity_warning());

    let march = resolver.resolve(MATERIAL, date(2024, 3, 1)).unwrap().unwrap();
    assert_eq!(march.record.id, january.id);

    let handoff = resolver.resolve(MATERIAL, date(2024, 6, 1)).unwrap().unwrap();
    assert_eq!(handoff.record.id, june.id);
    assert!(!handoff.has_integrity_warning());

    // 插入到两条修订之间: 前一条被截断，新修订截止于后一条
    let march_rev = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 21.0), date(2024, 3, 1)))
        .unwrap();
    assert_eq!(march_rev.expires_at, Some(date(2024, 6, 1)));

    let history = resolver.history(MATERIAL).unwrap();
    assert_eq!(history[1].expires_at, Some(date(2024, 3, 1)));
    assert!(resolver.audit_overlaps(MATERIAL).unwrap().is_empty());

    let april = resolver.resolve(MATERIAL, date(2024, 4, 1)).unwrap().unwrap();
    assert_eq!(april.record.id, march_rev.id);
    assert!(!april.has_integrity_warning());
}

#[test]
fn test_overlapping_revisions_pick_latest_and_warn() {
    let env = setup_env();
    seed_material(&env.repos, MATERIAL, 4);
    env.config
        .set_global_config_value("pricing/revision_auto_close", "false")
        .unwrap();
    let resolver = env.orchestrator.revision_resolver();

    let rev1 = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 20.0), date(2024, 1, 1)))
        .unwrap();
    let rev2 = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 22.0), date(2024, 4, 1)))
        .unwrap();

    let effective = resolver.resolve(MATERIAL, date(2024, 5, 1)).unwrap().unwrap();
    assert_eq!(effective.record.id, rev2.id);
    let warning = effective.integrity_warning.expect("重叠必须告警");
    assert_eq!(warning.kind, IntegrityViolationKind::OverlappingPriceRevisions);
    assert_eq!(warning.conflicting_ids, vec![rev1.id]);

    let audit = resolver.audit_overlaps(MATERIAL).unwrap();
    assert_eq!(audit.len(), 1);

    // 计价结果同样携带告警
    env.orchestrator
        .tier_resolver()
        .set_tiers(
            "C-3003",
            &[materials_pricing::TierSetting::new(4, Tier::from_str("03").unwrap())],
            date(2024, 1, 1),
        )
        .unwrap();
    let calc = env
        .orchestrator
        .calculate_customer_price("C-3003", MATERIAL, 1.0, Some(date(2024, 5, 1)))
        .unwrap()
        .into_priced()
        .unwrap();
    assert_eq!(calc.final_price, 22.0);
    assert_eq!(calc.warnings.len(), 1);
}

#[test]
fn test_same_day_revisions_pick_higher_revision_number() {
    let env = setup_env();
    seed_material(&env.repos, MATERIAL, 4);
    let resolver = env.orchestrator.revision_resolver();

    resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 20.0), date(2024, 1, 1)))
        .unwrap();
    let correction = resolver
        .create_revision(&new_revision(MATERIAL, prices("03", 19.5), date(2024, 1, 1)))
        .unwrap();

    let effective = resolver.resolve(MATERIAL, date(2024, 1, 1)).unwrap().unwrap();
    assert_eq!(effective.record.revision_number, correction.revision_number);
    assert!(!effective.has_integrity_warning());
}

#[test]
fn test_revision_validation() {
    let env = setup_env();
    seed_material(&env.repos, MATERIAL, 4);
    let resolver = env.orchestrator.revision_resolver();

    // L5 不能出现在等级价格中
    let mut l5 = TierPrices::new();
    l5.insert_label("L5", 10.0);
    let result = resolver.create_revision(&new_revision(MATERIAL, l5, date(2024, 1, 1)));
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));

    let mut bad_label = TierPrices::new();
    bad_label.insert_label("9", 10.0);
    let result = resolver.create_revision(&new_revision(MATERIAL, bad_label, date(2024, 1, 1)));
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));

    let mut inverted = new_revision(MATERIAL, prices("01", 10.0), date(2024, 6, 1));
    inverted.expires_at = Some(date(2024, 5, 1));
    let result = resolver.create_revision(&inverted);
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));

    // 未登记材料触发外键约束
    let result =
        resolver.create_revision(&new_revision("M-GHOST", prices("01", 10.0), date(2024, 1, 1)));
    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));

    assert!(resolver.history(MATERIAL).unwrap().is_empty());
}
