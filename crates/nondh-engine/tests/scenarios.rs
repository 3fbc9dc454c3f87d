//! # End-to-end scenarios for the Nondh Engine
//!
//! ## Test Categories
//!
//! 1. **Validity chain** - parity across the canonical order
//! 2. **Ownership succession** - pool building, transfers, area caps
//! 3. **Adjudication** - affected-entry propagation, first and second right
//! 4. **Service flow** - load, compute, verify, save against the in-memory store

use nondh_engine::algorithms::area::{from_acre_guntha, to_display};
use nondh_engine::domain::invariants::first_violation;
use nondh_engine::*;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("nondh_engine=debug")
        .try_init();
}

fn survey_nondh(id: &str, number: &str) -> Nondh {
    Nondh::new(id, number).with_ref(SurveyRef::survey("45"))
}

fn possessor(id: &str, nondh_id: &str, owner: &str, sqm: f64) -> NondhDetail {
    NondhDetail::new(id, nondh_id, AmendmentKind::Possessor).with_owner(OwnerRelation::new(
        format!("{id}-o"),
        owner,
        Area::from_sqm(sqm),
    ))
}

// =============================================================================
// VALIDITY CHAIN
// =============================================================================

#[test]
fn invalid_middle_nondh_flips_only_its_predecessors() {
    init_tracing();
    let nondhs = vec![
        survey_nondh("n3", "3"),
        survey_nondh("n1", "1"),
        survey_nondh("n2", "2"),
    ];
    let details = vec![
        possessor("d1", "n1", "A", 100.0),
        possessor("d2", "n2", "B", 100.0).with_status(NondhStatus::Invalid, Some("radd")),
        possessor("d3", "n3", "C", 100.0),
    ];

    let order = canonical_order(&nondhs);
    let numbers: Vec<_> = order.iter().map(|n| n.number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2", "3"]);

    let resolved = resolve(&order, &details);
    assert!(!resolved[0].owner_relations[0].is_valid);
    assert!(resolved[1].owner_relations[0].is_valid);
    assert!(resolved[2].owner_relations[0].is_valid);
    assert_eq!(resolved[1].status, NondhStatus::Invalid);
}

#[test]
fn survey_refs_outrank_block_and_resurvey() {
    let nondhs = vec![
        Nondh::new("r", "1").with_ref(SurveyRef::resurvey("7")),
        Nondh::new("b", "1").with_ref(SurveyRef::block("7")),
        Nondh::new("s", "9").with_ref(SurveyRef::survey("7")),
        Nondh::new("x", "0"),
    ];

    let ids: Vec<_> = canonical_order(&nondhs).into_iter().map(|n| n.id).collect();
    assert_eq!(ids, vec!["s", "b", "r", "x"]);
}

// =============================================================================
// OWNERSHIP SUCCESSION
// =============================================================================

#[test]
fn second_new_owner_capped_at_remaining_area() {
    init_tracing();
    let detail = NondhDetail::new("d2", "n2", AmendmentKind::SaleTransfer)
        .with_owner(OwnerRelation::new("b", "B", Area::ZERO))
        .with_owner(OwnerRelation::new("c", "C", Area::ZERO));
    let spec = TransferSpec {
        old_owner_name: Some("A".into()),
        old_owner_area: Area::from_sqm(1000.0),
        new_owner_ids: vec!["b".into(), "c".into()],
        ..Default::default()
    }
    .with_area("b", Area::from_sqm(600.0))
    .with_area("c", Area::from_sqm(500.0));

    let err = apply_transfer(&detail, &spec).unwrap_err();

    assert_eq!(
        err,
        EngineError::AreaExceeded {
            owner_id: "c".into(),
            requested: 500.0,
            max_allowed: 400.0,
        }
    );
    assert!(!err.is_fatal());
}

#[test]
fn partial_transfer_leaves_residue_with_old_owner() {
    let nondhs = vec![
        survey_nondh("n1", "1"),
        survey_nondh("n2", "2"),
        survey_nondh("n3", "3"),
    ];
    let order = canonical_order(&nondhs);
    let sale = NondhDetail::new("d2", "n2", AmendmentKind::SaleTransfer)
        .with_owner(OwnerRelation::new("b", "B", Area::ZERO));
    let pool = previous_owners(&order, &[possessor("d1", "n1", "A", 1000.0)], None, "n2").unwrap();

    let sale = select_old_owner(&sale, &pool[0]).unwrap();
    let sale = set_new_owner_area(&sale, "b", Area::from_sqm(250.0)).unwrap();
    assert_eq!(transfer_state(&sale), TransferState::Partial);

    let details = resolve(
        &order,
        &[
            possessor("d1", "n1", "A", 1000.0),
            sale,
            NondhDetail::new("d3", "n3", AmendmentKind::Inheritance),
        ],
    );
    let pool = previous_owners(&order, &details, None, "n3").unwrap();

    let holdings: Vec<_> = pool
        .iter()
        .map(|r| (r.owner_name.as_str(), r.area.sqm()))
        .collect();
    assert_eq!(holdings, vec![("A", 750.0), ("B", 250.0)]);
}

#[test]
fn equal_distribution_follows_owner_changes() {
    let sale = NondhDetail::new("d2", "n2", AmendmentKind::GiftTransfer)
        .with_old_owner("A", Area::from_sqm(900.0));
    let sale = set_equal_distribution(&sale, true).unwrap();

    let sale = add_new_owner(&sale, OwnerRelation::new("b", "B", Area::ZERO)).unwrap();
    let sale = add_new_owner(&sale, OwnerRelation::new("c", "C", Area::ZERO)).unwrap();
    let sale = add_new_owner(&sale, OwnerRelation::new("d", "D", Area::ZERO)).unwrap();
    assert!(sale
        .owner_relations
        .iter()
        .all(|o| o.area.approx_eq(Area::from_sqm(300.0), 1e-9)));
    assert_eq!(transfer_state(&sale), TransferState::Balanced);

    let sale = remove_new_owner(&sale, "d").unwrap();
    assert!(sale
        .owner_relations
        .iter()
        .all(|o| o.area.approx_eq(Area::from_sqm(450.0), 1e-9)));
}

#[test]
fn acre_guntha_input_feeds_transfer() {
    let old_area = from_acre_guntha(AcreGuntha {
        acres: 2,
        gunthas: 20.0,
    });
    let display = to_display(old_area);
    assert_eq!(display, AcreGunthaDisplay { acres: 2, gunthas: 20 });

    let sale = NondhDetail::new("d2", "n2", AmendmentKind::SaleTransfer)
        .with_old_owner("A", old_area)
        .with_owner(OwnerRelation::new("b", "B", Area::ZERO));
    let one_acre = to_square_meters(1.0, AreaUnit::Acre);

    let sale = set_new_owner_area(&sale, "b", one_acre).unwrap();
    assert_eq!(transfer_state(&sale), TransferState::Partial);

    let too_much = to_square_meters(3.0, AreaUnit::Acre);
    assert!(matches!(
        set_new_owner_area(&sale, "b", too_much),
        Err(EngineError::AreaExceeded { .. })
    ));
}

// =============================================================================
// ADJUDICATION
// =============================================================================

#[test]
fn hukam_invalidation_ripples_before_referenced_nondh() {
    init_tracing();
    let nondhs: Vec<_> = (1..=5)
        .map(|n| survey_nondh(&format!("n{n}"), &n.to_string()))
        .collect();
    let order = canonical_order(&nondhs);
    let hukam = NondhDetail::new("d5", "n5", AmendmentKind::Adjudication).with_adjudication(
        Adjudication::new("Collector", RightClass::First).with_entry(AffectedEntry::new("e1", "3")),
    );
    let details = resolve(
        &order,
        &[
            possessor("d1", "n1", "A", 100.0),
            possessor("d2", "n2", "B", 100.0),
            possessor("d3", "n3", "C", 100.0),
            possessor("d4", "n4", "D", 100.0),
            hukam,
        ],
    );

    let outcome =
        propagate_affected_status(&order, &details, "d5", "e1", NondhStatus::Invalid, Some("void"))
            .unwrap();

    let flags: Vec<_> = outcome
        .details
        .iter()
        .map(|d| d.owner_relations.first().map(|o| o.is_valid))
        .collect();
    assert_eq!(
        flags,
        vec![Some(false), Some(false), Some(true), Some(true), None]
    );
    assert_eq!(outcome.details[2].invalid_reason.as_deref(), Some("void"));
    assert_eq!(outcome.touched_nondh_ids, vec!["n1", "n2", "n3", "n5"]);

    let changes = diff_details(&details, &outcome.details);
    assert_eq!(changes.len(), 4);
}

#[test]
fn first_right_consumes_pool_and_second_right_copies_it() {
    let nondhs = vec![
        survey_nondh("n1", "1"),
        survey_nondh("n2", "2"),
        survey_nondh("n3", "3"),
        survey_nondh("n4", "4"),
    ];
    let order = canonical_order(&nondhs);
    let base = vec![
        possessor("d1", "n1", "A", 1000.0),
        possessor("d2", "n2", "B", 500.0),
    ];

    let first = NondhDetail::new("d3", "n3", AmendmentKind::Adjudication)
        .with_adjudication(Adjudication::new("Mamlatdar", RightClass::First));
    let pool = previous_owners(&order, &base, None, "n3").unwrap();
    let first = apply_first_right(
        &first,
        vec![RightTransfer {
            id: "t1".into(),
            old_owner_name: "A".into(),
            old_owner_area: Area::from_sqm(1000.0),
            equal_distribution: true,
            new_owners: vec![
                OwnerRelation::new("x", "X", Area::ZERO),
                OwnerRelation::new("y", "Y", Area::ZERO),
            ],
        }],
        &pool,
    )
    .unwrap();

    let mut details = base.clone();
    details.push(first);
    let details = resolve(&order, &details);

    let pool = previous_owners(&order, &details, None, "n4").unwrap();
    let names: Vec<_> = pool.iter().map(|r| r.owner_name.as_str()).collect();
    assert_eq!(names, vec!["B", "X", "Y"]);

    let second = NondhDetail::new("d4", "n4", AmendmentKind::Adjudication)
        .with_adjudication(Adjudication::new("Mamlatdar", RightClass::Second));
    let second = import_second_right(&second, &pool).unwrap();
    assert_eq!(second.owner_relations.len(), 3);
    assert_eq!(second.owner_relations[0].id, "d4-r1");
}

// =============================================================================
// SERVICE FLOW
// =============================================================================

#[test]
fn service_round_trip_through_store() {
    init_tracing();
    let store = InMemorySnapshotStore::new();
    store
        .insert(
            LandRecordSnapshot::new("lr-7")
                .with_entry(survey_nondh("n1", "1"), possessor("d1", "n1", "A", 1000.0))
                .with_entry(
                    survey_nondh("n2", "2"),
                    NondhDetail::new("d2", "n2", AmendmentKind::SaleTransfer)
                        .with_owner(OwnerRelation::new("b", "B", Area::ZERO)),
                )
                .with_entry(
                    survey_nondh("n3", "3"),
                    NondhDetail::new("d3", "n3", AmendmentKind::Adjudication).with_adjudication(
                        Adjudication::new("Collector", RightClass::First)
                            .with_entry(AffectedEntry::new("e1", "2")),
                    ),
                ),
        )
        .unwrap();
    let service = NondhEngineService::new(store);

    service.resolve_record("lr-7").unwrap();
    let pool = service.previous_owners("lr-7", None, "n2").unwrap();
    assert_eq!(pool.len(), 1);

    let spec = TransferSpec {
        old_owner_name: Some(pool[0].owner_name.clone()),
        old_owner_area: pool[0].area,
        new_owner_ids: vec!["b".into()],
        ..Default::default()
    }
    .with_area("b", Area::from_sqm(400.0));
    service.transfer("lr-7", "d2", &spec).unwrap();

    let propagation = service
        .propagate_affected("lr-7", "d3", "e1", NondhStatus::Invalid, Some("fraud"))
        .unwrap();
    assert_eq!(propagation.referenced_nondh_id, "n2");

    let stored = service.store().load("lr-7").unwrap();
    assert_eq!(stored.revision, 3);
    assert!(!stored.details[0].owner_relations[0].is_valid);
    assert!(stored.details[1].owner_relations[0].is_valid);

    let order = canonical_order(&stored.nondhs);
    assert_eq!(first_violation(&stored, &order), None);

    let pool = service.previous_owners("lr-7", None, "n3").unwrap();
    let names: Vec<_> = pool.iter().map(|r| r.owner_name.as_str()).collect();
    assert_eq!(names, vec!["A"]);
}
