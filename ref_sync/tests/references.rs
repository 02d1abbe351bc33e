//! Reference planning checked against an in-memory schema catalog

use pretty_assertions::assert_eq;
use rstest::*;

use ref_sync::schema::types::{Column, Index, Table};
use ref_sync::{
    ColumnOp, ColumnType, DatabaseSchema, Error, IndexOp, ReferenceOptions, ReferencePlanner,
    SchemaCatalog,
};

const TABLE: &str = "test_models";

/// `test_models` with an indexed `supplier_id`
#[fixture]
fn schema() -> DatabaseSchema {
    let mut table = Table::new(TABLE);
    table.add_column(Column::new("id", ColumnType::Integer).nullable(false));
    table.add_column(Column::new("supplier_id", ColumnType::Integer));
    table.add_index(Index::new("index_test_models_on_supplier_id", &["supplier_id"]));

    let mut schema = DatabaseSchema::new(None);
    schema.add_table(table);
    schema
}

#[fixture]
fn planner() -> ReferencePlanner {
    ReferencePlanner::default()
}

/// Adds `supplier_type` and a composite index over the supplier pair
fn with_polymorphic_column(schema: &mut DatabaseSchema) {
    schema
        .apply(&ColumnOp::add(TABLE, "supplier_type", ColumnType::String).into())
        .unwrap();
    schema
        .apply(
            &IndexOp::add(
                TABLE,
                vec!["supplier_id".to_string(), "supplier_type".to_string()],
                Some("index_test_models_on_supplier_id_and_supplier_type".to_string()),
            )
            .into(),
        )
        .unwrap();
}

fn add(
    schema: &mut DatabaseSchema,
    planner: &ReferencePlanner,
    name: &str,
    options: ReferenceOptions,
) -> Result<(), Error> {
    let plan = planner.add_reference(TABLE, name, options)?;
    schema.apply_all(&plan.ops)
}

fn remove(
    schema: &mut DatabaseSchema,
    planner: &ReferencePlanner,
    name: &str,
    options: ReferenceOptions,
) -> Result<(), Error> {
    let plan = planner.remove_reference(TABLE, name, options)?;
    schema.apply_all(&plan.ops)
}

#[rstest]
fn creates_reference_id_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "user", ReferenceOptions::new()).unwrap();

    assert!(schema.column_exists(TABLE, "user_id", ColumnType::Integer, None));
}

#[rstest]
fn does_not_create_reference_type_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "taggable", ReferenceOptions::new()).unwrap();

    assert!(!schema.column_exists(TABLE, "taggable_type", ColumnType::String, None));
}

#[rstest]
fn creates_reference_type_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "taggable", ReferenceOptions::new().polymorphic()).unwrap();

    assert!(schema.column_exists(TABLE, "taggable_id", ColumnType::Integer, None));
    assert!(schema.column_exists(TABLE, "taggable_type", ColumnType::String, None));
    let column = schema.table(TABLE).unwrap().column("taggable_type").unwrap();
    assert_eq!(column.default, None);
}

#[rstest]
fn creates_reference_id_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "user", ReferenceOptions::new().index()).unwrap();

    assert!(schema.index_exists(TABLE, &["user_id"], None));
}

#[rstest]
fn does_not_create_reference_id_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "user", ReferenceOptions::new()).unwrap();

    assert!(!schema.index_exists(TABLE, &["user_id"], None));
}

#[rstest]
fn creates_polymorphic_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(&mut schema, &planner, "taggable", ReferenceOptions::new().polymorphic().index()).unwrap();

    assert!(schema.index_exists(TABLE, &["taggable_id", "taggable_type"], None));
    assert!(!schema.index_exists(TABLE, &["taggable_type", "taggable_id"], None));
}

#[rstest]
fn creates_reference_type_column_with_default(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(
        &mut schema,
        &planner,
        "taggable",
        ReferenceOptions::new().polymorphic_with_default("Photo").index(),
    )
    .unwrap();

    assert!(schema.column_exists(TABLE, "taggable_type", ColumnType::String, Some("Photo")));
}

#[rstest]
fn creates_named_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    add(
        &mut schema,
        &planner,
        "tag",
        ReferenceOptions::new().index_named("index_taggings_on_tag_id"),
    )
    .unwrap();

    assert!(schema.index_exists(TABLE, &["tag_id"], Some("index_taggings_on_tag_id")));
}

#[rstest]
fn deletes_reference_id_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    remove(&mut schema, &planner, "supplier", ReferenceOptions::new()).unwrap();

    assert!(!schema.column_exists(TABLE, "supplier_id", ColumnType::Integer, None));
}

#[rstest]
fn deletes_reference_id_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    remove(&mut schema, &planner, "supplier", ReferenceOptions::new()).unwrap();

    assert!(!schema.index_exists(TABLE, &["supplier_id"], None));
}

#[rstest]
fn does_not_delete_reference_type_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    with_polymorphic_column(&mut schema);

    remove(&mut schema, &planner, "supplier", ReferenceOptions::new()).unwrap();

    assert!(!schema.column_exists(TABLE, "supplier_id", ColumnType::Integer, None));
    assert!(schema.column_exists(TABLE, "supplier_type", ColumnType::String, None));
}

#[rstest]
fn deletes_reference_type_column(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    with_polymorphic_column(&mut schema);

    remove(&mut schema, &planner, "supplier", ReferenceOptions::new().polymorphic()).unwrap();

    assert!(!schema.column_exists(TABLE, "supplier_id", ColumnType::Integer, None));
    assert!(!schema.column_exists(TABLE, "supplier_type", ColumnType::String, None));
}

#[rstest]
fn deletes_polymorphic_index(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    with_polymorphic_column(&mut schema);

    remove(&mut schema, &planner, "supplier", ReferenceOptions::new().polymorphic()).unwrap();

    assert!(!schema.index_exists(TABLE, &["supplier_id", "supplier_type"], None));
    assert!(schema.table(TABLE).unwrap().indexes.is_empty());
}

#[rstest]
fn polymorphic_removal_tolerates_missing_type_column(
    mut schema: DatabaseSchema,
    planner: ReferencePlanner,
) {
    remove(&mut schema, &planner, "supplier", ReferenceOptions::new().polymorphic()).unwrap();

    assert!(!schema.column_exists(TABLE, "supplier_id", ColumnType::Integer, None));
}

#[rstest]
fn add_belongs_to_alias(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    let plan = planner.add_belongs_to(TABLE, "user", ReferenceOptions::new()).unwrap();
    schema.apply_all(&plan.ops).unwrap();

    assert!(schema.column_exists(TABLE, "user_id", ColumnType::Integer, None));
}

#[rstest]
fn remove_belongs_to_alias(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    let plan = planner.remove_belongs_to(TABLE, "supplier", ReferenceOptions::new()).unwrap();
    schema.apply_all(&plan.ops).unwrap();

    assert!(!schema.column_exists(TABLE, "supplier_id", ColumnType::Integer, None));
}

#[rstest]
fn adding_existing_reference_conflicts(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    let err = add(&mut schema, &planner, "supplier", ReferenceOptions::new()).unwrap_err();

    assert!(err.is_schema_conflict());
}

#[rstest]
fn failed_step_leaves_earlier_steps_applied(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    schema
        .apply(&ColumnOp::add(TABLE, "owner_type", ColumnType::String).into())
        .unwrap();

    let err = add(&mut schema, &planner, "owner", ReferenceOptions::new().polymorphic().index())
        .unwrap_err();

    assert!(err.is_schema_conflict());
    assert!(schema.column_exists(TABLE, "owner_id", ColumnType::Integer, None));
    assert!(!schema.index_exists(TABLE, &["owner_id", "owner_type"], None));
}

#[rstest]
fn invalid_name_plans_nothing(schema: DatabaseSchema, planner: ReferencePlanner) {
    let before = schema.table(TABLE).unwrap().columns.len();
    let mut schema = schema;

    let err = add(&mut schema, &planner, "", ReferenceOptions::new().index()).unwrap_err();

    assert!(err.is_invalid_specification());
    assert_eq!(schema.table(TABLE).unwrap().columns.len(), before);
}

#[rstest]
fn inverted_add_restores_schema(mut schema: DatabaseSchema, planner: ReferencePlanner) {
    let plan = planner
        .add_reference(TABLE, "taggable", ReferenceOptions::new().polymorphic().index())
        .unwrap();

    schema.apply_all(&plan.ops).unwrap();
    schema.apply_all(&plan.invert().ops).unwrap();

    assert!(!schema.column_exists(TABLE, "taggable_id", ColumnType::Integer, None));
    assert!(!schema.column_exists(TABLE, "taggable_type", ColumnType::String, None));
    assert!(schema.index_exists(TABLE, &["supplier_id"], None));
}

#[rstest]
#[case("tag2")]
#[case("user_v2")]
#[case("_owner")]
fn snake_case_reference_round_trips(
    mut schema: DatabaseSchema,
    planner: ReferencePlanner,
    #[case] name: &str,
) {
    let id_column = format!("{}_id", name);

    add(&mut schema, &planner, name, ReferenceOptions::new().index()).unwrap();
    assert!(schema.column_exists(TABLE, &id_column, ColumnType::Integer, None));
    assert!(schema.index_exists(TABLE, &[id_column.as_str()], None));

    remove(&mut schema, &planner, name, ReferenceOptions::new()).unwrap();
    assert!(!schema.column_exists(TABLE, &id_column, ColumnType::Integer, None));
    assert!(!schema.index_exists(TABLE, &[id_column.as_str()], None));
}
