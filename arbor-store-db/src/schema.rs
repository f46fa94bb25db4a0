// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

//! Database schema definitions.
//!
//! Only the SQLite schema is executed by this crate. The PostgreSQL and MySQL
//! variants describe the same tables for provisioning those engines by hand.

use arbor_query::Platform;

/// Tables in drop order: dependents before the tables they point at.
pub const TABLES: [&str; 9] = [
    "type_children",
    "type_properties",
    "type_nodes",
    "weak_references",
    "references",
    "binary_data",
    "nodes",
    "namespaces",
    "workspaces",
];

/// SQLite schema, also used by the store itself.
pub const SQLITE_SCHEMA_SQL: &str = r#"
create table if not exists workspaces (
    name text primary key not null
);

create table if not exists namespaces (
    prefix text unique not null,
    uri    text unique not null
);

create table if not exists nodes (
    id              integer primary key autoincrement not null,
    identifier      text unique not null,
    path            text not null,
    parent          text,
    local_name      text not null,
    namespace       text not null,
    type            text not null,
    workspace_name  text not null,
    props           text not null,
    numerical_props text,
    depth           integer not null,
    sort_order      integer not null,
    unique (workspace_name, path),
    foreign key (workspace_name) references workspaces(name) on delete cascade
);

create index if not exists IndexNodeParent on nodes(workspace_name, parent, sort_order);
create index if not exists IndexNodeType on nodes(workspace_name, type);

create table if not exists binary_data (
    node_id        integer not null,
    property_name  text not null,
    workspace_name text not null,
    idx            integer not null,
    data           blob not null,
    primary key (node_id, property_name, idx),
    foreign key (node_id) references nodes(id) on delete cascade
);

create table if not exists "references" (
    source_id            integer not null,
    source_property_name text not null,
    target_id            integer not null,
    primary key (source_id, source_property_name, target_id)
);

create index if not exists IndexReferenceTarget on "references"(target_id);

create table if not exists weak_references (
    source_id            integer not null,
    source_property_name text not null,
    target_id            integer not null,
    primary key (source_id, source_property_name, target_id)
);

create index if not exists IndexWeakReferenceTarget on weak_references(target_id);

create table if not exists type_nodes (
    id                    integer primary key autoincrement not null,
    name                  text unique not null,
    supertypes            text not null,
    is_abstract           integer not null,
    is_mixin              integer not null,
    queryable             integer not null,
    orderable_child_nodes integer not null,
    primary_item          text
);

create table if not exists type_properties (
    node_type_id        integer not null,
    name                text not null,
    required_type       text,
    multiple            integer not null,
    mandatory           integer not null,
    auto_created        integer not null,
    protected           integer not null,
    on_parent_version   text not null,
    fulltext_searchable integer not null,
    query_orderable     integer not null,
    query_operators     text not null,
    default_values      text not null,
    foreign key (node_type_id) references type_nodes(id) on delete cascade
);

create table if not exists type_children (
    node_type_id           integer not null,
    name                   text not null,
    required_primary_types text not null,
    default_primary_type   text,
    mandatory              integer not null,
    auto_created           integer not null,
    protected              integer not null,
    on_parent_version      text not null,
    foreign key (node_type_id) references type_nodes(id) on delete cascade
);
"#;

/// PostgreSQL schema with JSONB property documents.
pub const POSTGRES_SCHEMA_SQL: &str = r#"
create table if not exists workspaces (
    name varchar(255) primary key
);

create table if not exists namespaces (
    prefix varchar(255) unique not null,
    uri    varchar(1024) unique not null
);

create table if not exists nodes (
    id              bigserial primary key,
    identifier      varchar(36) unique not null,
    path            text not null,
    parent          text,
    local_name      varchar(255) not null,
    namespace       varchar(255) not null,
    type            varchar(255) not null,
    workspace_name  varchar(255) not null references workspaces(name) on delete cascade,
    props           jsonb not null,
    numerical_props jsonb,
    depth           integer not null,
    sort_order      bigint not null,
    unique (workspace_name, path)
);

create index if not exists IndexNodeParent on nodes(workspace_name, parent, sort_order);
create index if not exists IndexNodeType on nodes(workspace_name, type);

create table if not exists binary_data (
    node_id        bigint not null references nodes(id) on delete cascade,
    property_name  varchar(255) not null,
    workspace_name varchar(255) not null,
    idx            integer not null,
    data           bytea not null,
    primary key (node_id, property_name, idx)
);

create table if not exists "references" (
    source_id            bigint not null,
    source_property_name varchar(255) not null,
    target_id            bigint not null,
    primary key (source_id, source_property_name, target_id)
);

create index if not exists IndexReferenceTarget on "references"(target_id);

create table if not exists weak_references (
    source_id            bigint not null,
    source_property_name varchar(255) not null,
    target_id            bigint not null,
    primary key (source_id, source_property_name, target_id)
);

create index if not exists IndexWeakReferenceTarget on weak_references(target_id);

create table if not exists type_nodes (
    id                    bigserial primary key,
    name                  varchar(255) unique not null,
    supertypes            jsonb not null,
    is_abstract           boolean not null,
    is_mixin              boolean not null,
    queryable             boolean not null,
    orderable_child_nodes boolean not null,
    primary_item          varchar(255)
);

create table if not exists type_properties (
    node_type_id        bigint not null references type_nodes(id) on delete cascade,
    name                varchar(255) not null,
    required_type       varchar(32),
    multiple            boolean not null,
    mandatory           boolean not null,
    auto_created        boolean not null,
    protected           boolean not null,
    on_parent_version   varchar(32) not null,
    fulltext_searchable boolean not null,
    query_orderable     boolean not null,
    query_operators     jsonb not null,
    default_values      jsonb not null
);

create table if not exists type_children (
    node_type_id           bigint not null references type_nodes(id) on delete cascade,
    name                   varchar(255) not null,
    required_primary_types jsonb not null,
    default_primary_type   varchar(255),
    mandatory              boolean not null,
    auto_created           boolean not null,
    protected              boolean not null,
    on_parent_version      varchar(32) not null
);
"#;

/// MySQL schema. Paths use a binary collation so that prefix ranges and
/// equality are case sensitive.
pub const MYSQL_SCHEMA_SQL: &str = r#"
create table if not exists workspaces (
    name varchar(64) primary key
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists namespaces (
    prefix varchar(255) unique not null,
    uri    varchar(512) unique not null
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists nodes (
    id              bigint auto_increment primary key,
    identifier      varchar(36) unique not null,
    path            varchar(700) not null,
    parent          varchar(700),
    local_name      varchar(255) not null,
    namespace       varchar(255) not null,
    type            varchar(255) not null,
    workspace_name  varchar(64) not null,
    props           json not null,
    numerical_props json,
    depth           integer not null,
    sort_order      bigint not null,
    unique (workspace_name, path),
    index IndexNodeParent (workspace_name, parent(255), sort_order),
    index IndexNodeType (workspace_name, type),
    foreign key (workspace_name) references workspaces(name) on delete cascade
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists binary_data (
    node_id        bigint not null,
    property_name  varchar(255) not null,
    workspace_name varchar(64) not null,
    idx            integer not null,
    data           longblob not null,
    primary key (node_id, property_name, idx),
    foreign key (node_id) references nodes(id) on delete cascade
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists `references` (
    source_id            bigint not null,
    source_property_name varchar(255) not null,
    target_id            bigint not null,
    primary key (source_id, source_property_name, target_id),
    index IndexReferenceTarget (target_id)
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists weak_references (
    source_id            bigint not null,
    source_property_name varchar(255) not null,
    target_id            bigint not null,
    primary key (source_id, source_property_name, target_id),
    index IndexWeakReferenceTarget (target_id)
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists type_nodes (
    id                    bigint auto_increment primary key,
    name                  varchar(255) unique not null,
    supertypes            json not null,
    is_abstract           boolean not null,
    is_mixin              boolean not null,
    queryable             boolean not null,
    orderable_child_nodes boolean not null,
    primary_item          varchar(255)
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists type_properties (
    node_type_id        bigint not null,
    name                varchar(255) not null,
    required_type       varchar(32),
    multiple            boolean not null,
    mandatory           boolean not null,
    auto_created        boolean not null,
    protected           boolean not null,
    on_parent_version   varchar(32) not null,
    fulltext_searchable boolean not null,
    query_orderable     boolean not null,
    query_operators     json not null,
    default_values      json not null,
    foreign key (node_type_id) references type_nodes(id) on delete cascade
) character set utf8mb4 collate utf8mb4_bin;

create table if not exists type_children (
    node_type_id           bigint not null,
    name                   varchar(255) not null,
    required_primary_types json not null,
    default_primary_type   varchar(255),
    mandatory              boolean not null,
    auto_created           boolean not null,
    protected              boolean not null,
    on_parent_version      varchar(32) not null,
    foreign key (node_type_id) references type_nodes(id) on delete cascade
) character set utf8mb4 collate utf8mb4_bin;
"#;

/// Create statements for `platform`.
pub fn create_sql(platform: Platform) -> &'static str {
    match platform {
        Platform::Sqlite => SQLITE_SCHEMA_SQL,
        Platform::Postgres => POSTGRES_SCHEMA_SQL,
        Platform::Mysql => MYSQL_SCHEMA_SQL,
    }
}

/// `references` is a reserved word on every engine.
pub fn quote_table(platform: Platform, table: &str) -> String {
    match (platform, table) {
        (Platform::Mysql, "references") => "`references`".to_owned(),
        (_, "references") => "\"references\"".to_owned(),
        _ => table.to_owned(),
    }
}

/// One `drop table` statement per table, in [`TABLES`] order.
pub fn drop_statements(platform: Platform) -> Vec<String> {
    TABLES
        .iter()
        .map(|table| format!("drop table {};", quote_table(platform, table)))
        .collect()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Platform::Sqlite)]
    #[case(Platform::Postgres)]
    #[case(Platform::Mysql)]
    fn every_table_is_created(#[case] platform: Platform) {
        let sql = create_sql(platform);
        for table in TABLES {
            let quoted = quote_table(platform, table);
            assert!(
                sql.contains(&format!("create table if not exists {quoted} (")),
                "{platform}: {table}"
            );
        }
    }

    #[test]
    fn drops_quote_the_reserved_table() {
        let drops = drop_statements(Platform::Mysql);
        assert_eq!(drops.len(), TABLES.len());
        assert_eq!(drops[0], "drop table type_children;");
        assert!(drops.contains(&"drop table `references`;".to_owned()));
        assert!(drop_statements(Platform::Sqlite).contains(&"drop table \"references\";".to_owned()));
    }
}
