//! Adapter tests against a scripted in-memory metadata source.
//!
//! Each rule answers queries whose SQL contains a marker and whose last bound
//! parameter (the table, index or type list) matches, so the adapters are
//! exercised without a database server.

use llmschema::catalog::{
    CatalogAdapter, MetadataSource, MySqlCatalog, Param, PostgresCatalog, Row, SqliteCatalog,
    Value,
};
use llmschema::error::{BoxError, Error};
use llmschema::extract::SchemaExtractor;
use llmschema::schema::Relation;

struct Rule {
    marker: &'static str,
    arg: Option<&'static str>,
    rows: Vec<Row>,
}

#[derive(Default)]
struct ScriptedSource {
    rules: Vec<Rule>,
    fail_on: Option<&'static str>,
    log: Vec<(String, Vec<String>)>,
}

impl ScriptedSource {
    fn on(mut self, marker: &'static str, arg: Option<&'static str>, rows: Vec<Row>) -> Self {
        self.rules.push(Rule { marker, arg, rows });
        self
    }

    fn failing_on(mut self, marker: &'static str) -> Self {
        self.fail_on = Some(marker);
        self
    }
}

impl MetadataSource for ScriptedSource {
    fn query(&mut self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>, BoxError> {
        let args: Vec<String> = params
            .iter()
            .map(|p| match p {
                Param::Text(s) => s.to_string(),
                Param::TextList(items) => items.join(","),
            })
            .collect();
        self.log.push((sql.to_string(), args.clone()));

        if self.fail_on.is_some_and(|m| sql.contains(m)) {
            return Err("relation does not exist".into());
        }

        let last = args.last().map(String::as_str);
        Ok(self
            .rules
            .iter()
            .find(|rule| sql.contains(rule.marker) && rule.arg.map_or(true, |a| last == Some(a)))
            .map(|rule| rule.rows.clone())
            .unwrap_or_default())
    }
}

fn row(values: Vec<Value>) -> Row {
    Row::new(values)
}

fn text(s: &str) -> Value {
    Value::from(s)
}

// =============================================================================
// PostgreSQL
// =============================================================================

mod postgres {
    use super::*;

    const LIST: &str = "information_schema.tables";
    const COLUMNS: &str = "information_schema.columns";
    const ENUMS: &str = "pg_enum";
    const PK: &str = "'PRIMARY KEY'";
    const FKS: &str = "contype = 'f'";
    const INDEXES: &str = "pg_index";

    #[allow(clippy::too_many_arguments)]
    fn column(
        name: &str,
        data_type: &str,
        nullable: &str,
        default: Option<&str>,
        unique: bool,
        udt_name: &str,
        max_len: Option<i64>,
    ) -> Row {
        row(vec![
            text(name),
            text(data_type),
            text(nullable),
            Value::from(default),
            Value::from(unique),
            text("public"),
            text(udt_name),
            Value::from(max_len),
        ])
    }

    fn shop() -> ScriptedSource {
        ScriptedSource::default()
            .on(LIST, None, vec![row(vec![text("orders")]), row(vec![text("users")])])
            .on(
                COLUMNS,
                Some("users"),
                vec![
                    column(
                        "id",
                        "integer",
                        "NO",
                        Some("nextval('users_id_seq'::regclass)"),
                        false,
                        "int4",
                        None,
                    ),
                    column("email", "character varying", "NO", None, true, "varchar", Some(255)),
                    column(
                        "status",
                        "USER-DEFINED",
                        "NO",
                        Some("'active'::user_status"),
                        false,
                        "user_status",
                        None,
                    ),
                    column("tags", "ARRAY", "YES", None, false, "_text", None),
                    column(
                        "created_at",
                        "timestamp with time zone",
                        "YES",
                        Some("now()"),
                        false,
                        "timestamptz",
                        None,
                    ),
                ],
            )
            .on(
                ENUMS,
                Some("public.user_status"),
                vec![
                    row(vec![text("public.user_status"), text("active")]),
                    row(vec![text("public.user_status"), text("inactive")]),
                    row(vec![text("public.user_status"), text("banned")]),
                ],
            )
            .on(PK, Some("users"), vec![row(vec![text("id")])])
            .on(
                INDEXES,
                Some("users"),
                vec![
                    row(vec![
                        text("idx_users_created"),
                        Value::from(false),
                        Value::from(vec!["created_at"]),
                    ]),
                    row(vec![
                        text("users_email_key"),
                        Value::from(true),
                        Value::from(vec!["email"]),
                    ]),
                ],
            )
            .on(
                COLUMNS,
                Some("orders"),
                vec![
                    column("id", "bigint", "NO", None, false, "int8", None),
                    column("user_id", "integer", "NO", None, false, "int4", None),
                ],
            )
            .on(PK, Some("orders"), vec![row(vec![text("id")])])
            .on(
                FKS,
                Some("orders"),
                vec![row(vec![text("user_id"), text("users"), text("id")])],
            )
    }

    #[test]
    fn test_list_tables_uses_namespace() {
        let mut catalog = PostgresCatalog::new(shop(), "public");
        assert_eq!(catalog.list_tables(None).unwrap(), vec!["orders", "users"]);
    }

    #[test]
    fn test_explicit_list_returned_verbatim() {
        let mut catalog = PostgresCatalog::new(ScriptedSource::default(), "public");
        let explicit = vec!["zeta".to_string(), "alpha".to_string()];
        assert_eq!(
            catalog.list_tables(Some(&explicit)).unwrap(),
            vec!["zeta", "alpha"]
        );
    }

    #[test]
    fn test_describe_users() {
        let mut catalog = PostgresCatalog::new(shop(), "public");
        let users = catalog.describe_table("users").unwrap();

        assert_eq!(users.primary_key, vec!["id"]);
        let types: Vec<&str> = users.columns.iter().map(|c| c.data_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["integer", "varchar(255)", "user_status", "text[]", "timestamptz"]
        );

        let email = users.column("email").unwrap();
        assert!(email.is_unique);
        assert!(!email.nullable);

        let status = users.column("status").unwrap();
        assert_eq!(status.enum_values, vec!["active", "inactive", "banned"]);
        assert_eq!(status.default.as_deref(), Some("'active'::user_status"));

        assert!(users.column("tags").unwrap().nullable);
        assert!(users.relations.is_empty());
        assert_eq!(users.indexes.len(), 2);
        assert_eq!(users.indexes[1].name, "users_email_key");
        assert!(users.indexes[1].is_unique);
    }

    #[test]
    fn test_enum_labels_fetched_in_one_lookup() {
        let mut source = shop();
        {
            let mut catalog = PostgresCatalog::new(&mut source, "public");
            catalog.describe_table("users").unwrap();
        }
        let lookups = source
            .log
            .iter()
            .filter(|(sql, _)| sql.contains(ENUMS))
            .count();
        assert_eq!(lookups, 1);

        source.log.clear();
        {
            let mut catalog = PostgresCatalog::new(&mut source, "public");
            catalog.describe_table("orders").unwrap();
        }
        assert!(!source.log.iter().any(|(sql, _)| sql.contains(ENUMS)));
    }

    #[test]
    fn test_describe_orders_relation() {
        let mut catalog = PostgresCatalog::new(shop(), "public");
        let orders = catalog.describe_table("orders").unwrap();
        assert_eq!(
            orders.relations,
            vec![Relation::many_to_one("user_id", "users", "id")]
        );
        assert_eq!(orders.column("id").unwrap().data_type, "bigint");
    }

    #[test]
    fn test_unknown_table_has_no_columns() {
        let mut catalog = PostgresCatalog::new(shop(), "public");
        let missing = catalog.describe_table("nope").unwrap();
        assert!(missing.columns.is_empty());
        assert!(missing.primary_key.is_empty());
    }

    #[test]
    fn test_query_failure_names_table() {
        let source = shop().failing_on(FKS);
        let mut catalog = PostgresCatalog::new(source, "public");
        match catalog.describe_table("orders") {
            Err(Error::MetadataQuery { table, .. }) => assert_eq!(table, "orders"),
            other => panic!("expected MetadataQuery, got {:?}", other),
        }
    }

    #[test]
    fn test_listing_failure() {
        let source = shop().failing_on(LIST);
        let mut catalog = PostgresCatalog::new(source, "public");
        assert!(matches!(
            catalog.list_tables(None),
            Err(Error::TableListing { .. })
        ));
    }

    #[test]
    fn test_extraction_aborts_on_first_failure() {
        let source = shop().failing_on(FKS);
        let result = SchemaExtractor::new(PostgresCatalog::new(source, "public")).extract();
        assert!(matches!(result, Err(Error::MetadataQuery { .. })));
    }

    #[test]
    fn test_extract_full_schema() {
        let extraction = SchemaExtractor::new(PostgresCatalog::new(shop(), "public"))
            .extract()
            .unwrap();
        let names: Vec<&str> = extraction.schema.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["orders", "users"]);
        assert_eq!(extraction.stats.columns, 7);
        assert_eq!(extraction.stats.relations, 1);
        assert_eq!(extraction.stats.indexes, 2);
    }
}

// =============================================================================
// MySQL
// =============================================================================

mod mysql {
    use super::*;

    const LIST: &str = "information_schema.tables";
    const COLUMNS: &str = "information_schema.columns";
    const PK: &str = "constraint_name = 'PRIMARY'";
    const FKS: &str = "referenced_table_name IS NOT NULL";
    const INDEXES: &str = "information_schema.statistics";

    fn column(
        name: &str,
        column_type: &str,
        nullable: &str,
        default: Option<&str>,
        unique: i64,
        data_type: &str,
    ) -> Row {
        row(vec![
            text(name),
            text(column_type),
            text(nullable),
            Value::from(default),
            Value::from(unique),
            text(data_type),
        ])
    }

    fn shop() -> ScriptedSource {
        ScriptedSource::default()
            .on(LIST, None, vec![row(vec![text("line_items")]), row(vec![text("products")])])
            .on(
                COLUMNS,
                Some("products"),
                vec![
                    column("id", "int unsigned", "NO", None, 0, "int"),
                    column("sku", "varchar(32)", "NO", None, 1, "varchar"),
                    column(
                        "size",
                        "enum('small','medium','large','x''l')",
                        "YES",
                        Some("medium"),
                        0,
                        "enum",
                    ),
                    column("flags", "set('a,b','c')", "YES", None, 0, "set"),
                ],
            )
            .on(PK, Some("products"), vec![row(vec![text("id")])])
            .on(
                INDEXES,
                Some("products"),
                vec![key_part("sku", 1, Some("sku"))],
            )
            .on(
                COLUMNS,
                Some("line_items"),
                vec![
                    column("order_id", "int", "NO", None, 0, "int"),
                    column("product_id", "int unsigned", "NO", None, 0, "int"),
                    column("qty", "int", "NO", Some("1"), 0, "int"),
                ],
            )
            .on(
                PK,
                Some("line_items"),
                vec![row(vec![text("order_id")]), row(vec![text("product_id")])],
            )
            .on(
                FKS,
                Some("line_items"),
                vec![row(vec![text("product_id"), text("products"), text("id")])],
            )
            .on(
                INDEXES,
                Some("line_items"),
                vec![
                    key_part("idx_product_qty", 0, Some("product_id")),
                    key_part("idx_product_qty", 0, Some("qty")),
                ],
            )
    }

    fn key_part(index: &str, unique: i64, column: Option<&str>) -> Row {
        row(vec![text(index), Value::from(unique), Value::from(column)])
    }

    #[test]
    fn test_list_tables_binds_database() {
        let mut source = shop();
        {
            let mut catalog = MySqlCatalog::new(&mut source, "shop");
            assert_eq!(
                catalog.list_tables(None).unwrap(),
                vec!["line_items", "products"]
            );
        }
        assert_eq!(source.log[0].1, vec!["shop"]);
    }

    #[test]
    fn test_enum_and_set_literals() {
        let mut catalog = MySqlCatalog::new(shop(), "shop");
        let products = catalog.describe_table("products").unwrap();

        let size = products.column("size").unwrap();
        assert_eq!(size.data_type, "enum");
        assert_eq!(size.enum_values, vec!["small", "medium", "large", "x'l"]);
        assert_eq!(size.default.as_deref(), Some("medium"));

        let flags = products.column("flags").unwrap();
        assert_eq!(flags.data_type, "set");
        assert_eq!(flags.enum_values, vec!["a,b", "c"]);

        assert_eq!(products.column("id").unwrap().data_type, "int unsigned");
        assert!(products.column("sku").unwrap().is_unique);
    }

    #[test]
    fn test_composite_primary_key_order() {
        let mut catalog = MySqlCatalog::new(shop(), "shop");
        let items = catalog.describe_table("line_items").unwrap();
        assert_eq!(items.primary_key, vec!["order_id", "product_id"]);
        assert_eq!(
            items.relations,
            vec![Relation::many_to_one("product_id", "products", "id")]
        );
        assert_eq!(items.indexes.len(), 1);
        assert_eq!(items.indexes[0].columns, vec!["product_id", "qty"]);
        assert!(!items.indexes[0].is_unique);
    }

    #[test]
    fn test_index_key_parts_grouped_by_name() {
        let source = ScriptedSource::default()
            .on(
                COLUMNS,
                Some("events"),
                vec![
                    column("a,b", "int", "NO", None, 0, "int"),
                    column("kind", "varchar(16)", "NO", None, 0, "varchar"),
                ],
            )
            .on(
                INDEXES,
                Some("events"),
                vec![
                    key_part("idx_expr", 0, None),
                    key_part("idx_kind", 1, Some("kind")),
                    key_part("idx_kind", 1, None),
                    key_part("idx_odd", 0, Some("a,b")),
                    key_part("idx_odd", 0, Some("kind")),
                ],
            );
        let mut catalog = MySqlCatalog::new(source, "shop");
        let events = catalog.describe_table("events").unwrap();

        let indexes: Vec<(&str, Vec<&str>, bool)> = events
            .indexes
            .iter()
            .map(|idx| {
                (
                    idx.name.as_str(),
                    idx.columns.iter().map(String::as_str).collect(),
                    idx.is_unique,
                )
            })
            .collect();
        assert_eq!(
            indexes,
            vec![
                ("idx_kind", vec!["kind"], true),
                ("idx_odd", vec!["a,b", "kind"], false),
            ]
        );
    }

    #[test]
    fn test_per_table_queries_bind_database_and_table() {
        let mut source = shop();
        {
            let mut catalog = MySqlCatalog::new(&mut source, "shop");
            catalog.describe_table("products").unwrap();
        }
        assert!(source
            .log
            .iter()
            .all(|(_, args)| args == &vec!["shop".to_string(), "products".to_string()]));
    }
}

// =============================================================================
// SQLite
// =============================================================================

mod sqlite {
    use super::*;

    const LIST: &str = "NOT LIKE 'sqlite";
    const TABLE_INFO: &str = "SELECT name, type";
    const PK: &str = "WHERE pk > 0";
    const CREATE_SQL: &str = "SELECT sql";
    const INDEX_LIST: &str = "pragma_index_list";
    const INDEX_INFO: &str = "pragma_index_info";
    const FKS: &str = "pragma_foreign_key_list";

    fn info(name: &str, declared: &str, notnull: i64, default: Option<&str>, pk: i64) -> Row {
        row(vec![
            text(name),
            text(declared),
            Value::from(notnull),
            Value::from(default),
            Value::from(pk),
        ])
    }

    fn db() -> ScriptedSource {
        ScriptedSource::default()
            .on(LIST, None, vec![row(vec![text("accounts")]), row(vec![text("memberships")])])
            .on(
                TABLE_INFO,
                Some("accounts"),
                vec![
                    info("id", "INTEGER", 0, None, 1),
                    info("handle", "VARCHAR(40)", 1, None, 0),
                    info("role", "TEXT", 1, Some("'member'"), 0),
                    info("blob_col", "", 0, None, 0),
                ],
            )
            .on(
                INDEX_LIST,
                Some("accounts"),
                vec![row(vec![
                    text("sqlite_autoindex_accounts_1"),
                    Value::from(1i64),
                    text("u"),
                ])],
            )
            .on(
                INDEX_INFO,
                Some("sqlite_autoindex_accounts_1"),
                vec![row(vec![text("handle")])],
            )
            .on(
                CREATE_SQL,
                Some("accounts"),
                vec![row(vec![text(
                    "CREATE TABLE accounts (id INTEGER PRIMARY KEY, handle VARCHAR(40) NOT NULL UNIQUE, \
                     role TEXT NOT NULL DEFAULT 'member' CHECK (role IN ('admin', 'member')), blob_col)",
                )])],
            )
            .on(PK, Some("accounts"), vec![row(vec![text("id")])])
            .on(
                TABLE_INFO,
                Some("memberships"),
                vec![
                    info("group_id", "INTEGER", 1, None, 2),
                    info("account_id", "INTEGER", 1, None, 1),
                ],
            )
            .on(
                INDEX_LIST,
                Some("memberships"),
                vec![row(vec![
                    text("sqlite_autoindex_memberships_1"),
                    Value::from(1i64),
                    text("pk"),
                ])],
            )
            .on(
                INDEX_INFO,
                Some("sqlite_autoindex_memberships_1"),
                vec![row(vec![text("account_id")]), row(vec![text("group_id")])],
            )
            .on(
                FKS,
                Some("memberships"),
                vec![row(vec![
                    Value::from(0i64),
                    Value::from(0i64),
                    text("accounts"),
                    text("account_id"),
                    Value::Null,
                ])],
            )
    }

    #[test]
    fn test_columns_and_types() {
        let mut catalog = SqliteCatalog::new(db());
        let accounts = catalog.describe_table("accounts").unwrap();

        let types: Vec<&str> = accounts.columns.iter().map(|c| c.data_type.as_str()).collect();
        assert_eq!(types, vec!["integer", "varchar(40)", "text", "blob"]);
        assert_eq!(accounts.primary_key, vec!["id"]);

        let handle = accounts.column("handle").unwrap();
        assert!(handle.is_unique);
        assert!(!handle.nullable);

        let role = accounts.column("role").unwrap();
        assert_eq!(role.default.as_deref(), Some("'member'"));
        assert_eq!(role.check.as_deref(), Some("role IN ('admin', 'member')"));
        assert!(accounts.column("id").unwrap().check.is_none());
    }

    #[test]
    fn test_composite_key_follows_pk_ordinal() {
        let mut catalog = SqliteCatalog::new(db());
        let memberships = catalog.describe_table("memberships").unwrap();

        let names: Vec<&str> = memberships.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["group_id", "account_id"]);
        assert_eq!(memberships.primary_key, vec!["account_id", "group_id"]);
        // The primary key's backing index is not listed
        assert!(memberships.indexes.is_empty());
    }

    #[test]
    fn test_foreign_key_without_column_targets_primary_key() {
        let mut catalog = SqliteCatalog::new(db());
        let memberships = catalog.describe_table("memberships").unwrap();
        assert_eq!(
            memberships.relations,
            vec![Relation::many_to_one("account_id", "accounts", "id")]
        );
    }

    #[test]
    fn test_unique_index_listed() {
        let mut catalog = SqliteCatalog::new(db());
        let accounts = catalog.describe_table("accounts").unwrap();
        assert_eq!(accounts.indexes.len(), 1);
        assert_eq!(accounts.indexes[0].columns, vec!["handle"]);
        assert!(accounts.indexes[0].is_unique);
    }

    #[test]
    fn test_list_tables() {
        let mut catalog = SqliteCatalog::new(db());
        assert_eq!(
            catalog.list_tables(None).unwrap(),
            vec!["accounts", "memberships"]
        );
    }
}
