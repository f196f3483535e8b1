#[cfg(test)]
mod tests {
    use barge_core::{
        DbField, DbFields, Field, Fields, GenericSqlWriter, OrderField, PostgresSqlWriter,
        RequestKind, SqlServerSqlWriter, SqlWriter, SqliteSqlWriter, StatementArgs,
        StatementError, Value,
    };
    use indoc::indoc;

    const SQLSERVER: SqlServerSqlWriter = SqlServerSqlWriter {};
    const GENERIC: GenericSqlWriter = GenericSqlWriter {};
    const POSTGRES: PostgresSqlWriter = PostgresSqlWriter {};
    const SQLITE: SqliteSqlWriter = SqliteSqlWriter {};

    /// One line SQL out of an indented block.
    fn sql(value: &str) -> String {
        value.trim().replace('\n', " ")
    }

    fn error(writer: &dyn SqlWriter, kind: RequestKind, args: &StatementArgs) -> StatementError {
        writer
            .create(kind, args)
            .expect_err("Expected the statement to be rejected")
            .downcast_ref::<StatementError>()
            .cloned()
            .expect("Expected a statement error")
    }

    fn people() -> DbFields {
        [
            DbField::new("Id").primary().identity().with_type(Value::Int64(None)),
            DbField::new("Name").not_null().with_type(Value::Varchar(None)),
            DbField::new("Age").with_type(Value::Int32(None)),
            DbField::new("Updated").generated(),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn delete_all() {
        let args = StatementArgs {
            table: "Table",
            ..Default::default()
        };
        assert_eq!(
            SQLSERVER.create(RequestKind::DeleteAll, &args).unwrap(),
            "DELETE FROM [Table] ;"
        );
        assert_eq!(
            GENERIC.create(RequestKind::DeleteAll, &args).unwrap(),
            r#"DELETE FROM "Table" ;"#
        );
        for table in ["dbo.Table", "[dbo].[Table]", " [dbo].Table "] {
            assert_eq!(
                SQLSERVER
                    .create(
                        RequestKind::DeleteAll,
                        &StatementArgs {
                            table,
                            ..Default::default()
                        }
                    )
                    .unwrap(),
                "DELETE FROM [dbo].[Table] ;"
            );
        }
    }

    #[test]
    fn delete_with_hints() {
        let db_fields = people();
        assert_eq!(
            SQLSERVER
                .create(
                    RequestKind::Delete,
                    &StatementArgs {
                        table: "People",
                        db_fields: Some(&db_fields),
                        hints: Some("WITH (TABLOCK)"),
                        ..Default::default()
                    }
                )
                .unwrap(),
            "DELETE FROM [People] WITH (TABLOCK) WHERE ( [Id] = @Id ) ;"
        );
    }

    #[test]
    fn insert_all_without_returning() {
        let fields: Fields = ["Field1", "Field2"].into();
        let query = GENERIC
            .create(
                RequestKind::InsertAll,
                &StatementArgs {
                    table: "Table",
                    fields: &fields,
                    batch_size: 3,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            query,
            sql(indoc! {r#"
                INSERT INTO "Table" ( "Field1", "Field2" )
                VALUES ( @Field1, @Field2 ), ( @Field1_1, @Field2_1 ), ( @Field1_2, @Field2_2 ) ;
            "#})
        );
    }

    #[test]
    fn insert_all_with_order_column() {
        let fields: Fields = ["Id", "Name", "Age", "Updated"].into();
        let db_fields = people();
        let query = SQLSERVER
            .create(
                RequestKind::InsertAll,
                &StatementArgs {
                    table: "People",
                    fields: &fields,
                    batch_size: 2,
                    db_fields: Some(&db_fields),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            query,
            sql(indoc! {"
                INSERT INTO [People] ( [Name], [Age] ) OUTPUT INSERTED.[Id] AS [Result]
                SELECT [Name], [Age] FROM ( VALUES ( @Name, @Age, @__RepoDb_OrderColumn_0 ), ( @Name_1, @Age_1, @__RepoDb_OrderColumn_1 ) )
                AS T ( [Name], [Age], [__RepoDb_OrderColumn] ) ORDER BY [__RepoDb_OrderColumn] ;
            "})
        );
    }

    #[test]
    fn insert_all_of_one_row_matches_insert() {
        let fields: Fields = ["Id", "Name", "Age"].into();
        let db_fields = people();
        let args = StatementArgs {
            table: "People",
            fields: &fields,
            db_fields: Some(&db_fields),
            batch_size: 1,
            ..Default::default()
        };
        let writers: [&dyn SqlWriter; 3] = [&GENERIC, &POSTGRES, &SQLITE];
        for writer in writers {
            assert_eq!(
                writer.create(RequestKind::Insert, &args).unwrap(),
                writer.create(RequestKind::InsertAll, &args).unwrap(),
                "{}",
                writer.name()
            );
        }
        let insert = SQLSERVER.create(RequestKind::Insert, &args).unwrap();
        let insert_all = SQLSERVER.create(RequestKind::InsertAll, &args).unwrap();
        assert_eq!(
            insert,
            "INSERT INTO [People] ( [Name], [Age] ) OUTPUT INSERTED.[Id] AS [Result] VALUES ( @Name, @Age ) ;"
        );
        assert_eq!(
            insert_all,
            sql(indoc! {"
                INSERT INTO [People] ( [Name], [Age] ) OUTPUT INSERTED.[Id] AS [Result]
                SELECT [Name], [Age] FROM ( VALUES ( @Name, @Age, @__RepoDb_OrderColumn_0 ) )
                AS T ( [Name], [Age], [__RepoDb_OrderColumn] ) ORDER BY [__RepoDb_OrderColumn] ;
            "})
        );
        let head = "INSERT INTO [People] ( [Name], [Age] ) OUTPUT INSERTED.[Id] AS [Result]";
        assert!(insert.starts_with(head) && insert_all.starts_with(head));
    }

    #[test]
    fn insert_returning() {
        let fields: Fields = ["Id", "Name"].into();
        let db_fields = people();
        let args = StatementArgs {
            table: "People",
            fields: &fields,
            db_fields: Some(&db_fields),
            batch_size: 1,
            ..Default::default()
        };
        assert_eq!(
            POSTGRES.create(RequestKind::Insert, &args).unwrap(),
            r#"INSERT INTO "People" ( "Name" ) VALUES ( @Name ) RETURNING "Id" ;"#
        );
        assert_eq!(
            SQLITE
                .create(
                    RequestKind::InsertAll,
                    &StatementArgs {
                        batch_size: 2,
                        ..args
                    }
                )
                .unwrap(),
            r#"INSERT INTO "People" ( "Name" ) VALUES ( @Name ), ( @Name_1 ) RETURNING "Id" ;"#
        );
        assert!(matches!(
            error(
                &POSTGRES,
                RequestKind::InsertAll,
                &StatementArgs {
                    batch_size: 2,
                    ..args
                }
            ),
            StatementError::NotSupported(..)
        ));
    }

    #[test]
    fn update_all() {
        let fields: Fields = ["Id", "Name", "Age", "Updated"].into();
        let db_fields = people();
        let query = SQLSERVER
            .create(
                RequestKind::UpdateAll,
                &StatementArgs {
                    table: "People",
                    fields: &fields,
                    batch_size: 2,
                    db_fields: Some(&db_fields),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            query,
            sql(indoc! {"
                UPDATE [People] SET [Name] = @Name, [Age] = @Age WHERE ( [Id] = @Id ) ;
                UPDATE [People] SET [Name] = @Name_1, [Age] = @Age_1 WHERE ( [Id] = @Id_1 ) ;
            "})
        );
    }

    #[test]
    fn update_with_qualifiers() {
        let fields: Fields = ["Name", "Age"].into();
        let qualifiers: Fields = ["Name"].into();
        assert_eq!(
            GENERIC
                .create(
                    RequestKind::Update,
                    &StatementArgs {
                        table: "People",
                        fields: &fields,
                        qualifiers: &qualifiers,
                        ..Default::default()
                    }
                )
                .unwrap(),
            r#"UPDATE "People" SET "Age" = @Age WHERE ( "Name" = @Name ) ;"#
        );
        let qualifiers: Fields = ["Name", "Missing"].into();
        assert_eq!(
            error(
                &GENERIC,
                RequestKind::Update,
                &StatementArgs {
                    table: "People",
                    fields: &fields,
                    qualifiers: &qualifiers,
                    ..Default::default()
                }
            ),
            StatementError::InvalidQualifiers(vec!["Missing".into()])
        );
    }

    #[test]
    fn merge() {
        let fields: Fields = ["Id", "Name"].into();
        let identity = DbField::new("Id").identity();
        assert_eq!(
            SQLSERVER
                .create(
                    RequestKind::Merge,
                    &StatementArgs {
                        table: "People",
                        fields: &fields,
                        identity: Some(&identity),
                        ..Default::default()
                    }
                )
                .unwrap(),
            sql(indoc! {"
                MERGE [People] AS T USING ( SELECT @Id AS [Id], @Name AS [Name] ) AS S
                ON ( S.[Id] = T.[Id] )
                WHEN NOT MATCHED THEN INSERT ( [Name] ) VALUES ( S.[Name] )
                WHEN MATCHED THEN UPDATE SET T.[Name] = S.[Name]
                OUTPUT INSERTED.[Id] AS [Result] ;
            "})
        );
        let primary = DbField::new("Id").primary();
        assert_eq!(
            GENERIC
                .create(
                    RequestKind::Merge,
                    &StatementArgs {
                        table: "People",
                        fields: &fields,
                        primary: Some(&primary),
                        ..Default::default()
                    }
                )
                .unwrap(),
            sql(indoc! {r#"
                INSERT INTO "People" ( "Id", "Name" ) VALUES ( @Id, @Name )
                ON CONFLICT ( "Id" ) DO UPDATE SET "Name" = EXCLUDED."Name"
                RETURNING "Id" ;
            "#})
        );
    }

    #[test]
    fn merge_all_needs_a_key() {
        let fields: Fields = ["Name", "Age"].into();
        for writer in [&SQLSERVER as &dyn SqlWriter, &GENERIC, &SQLITE] {
            assert_eq!(
                error(
                    writer,
                    RequestKind::MergeAll,
                    &StatementArgs {
                        table: "dbo.People",
                        fields: &fields,
                        batch_size: 10,
                        ..Default::default()
                    }
                ),
                StatementError::KeyFieldNotFound("dbo.People".into())
            );
        }
    }

    #[test]
    fn query() {
        let fields: Fields = ["Id", "Name"].into();
        let qualifiers: Fields = ["Name"].into();
        let order_by = [OrderField::desc("Id")];
        let args = StatementArgs {
            table: "People",
            fields: &fields,
            qualifiers: &qualifiers,
            order_by: &order_by,
            top: Some(10),
            ..Default::default()
        };
        assert_eq!(
            SQLSERVER
                .create(
                    RequestKind::Query,
                    &StatementArgs {
                        hints: Some("WITH (NOLOCK)"),
                        ..args
                    }
                )
                .unwrap(),
            "SELECT TOP (10) [Id], [Name] FROM [People] WITH (NOLOCK) WHERE ( [Name] = @Name ) ORDER BY [Id] DESC ;"
        );
        assert_eq!(
            GENERIC.create(RequestKind::Query, &args).unwrap(),
            r#"SELECT "Id", "Name" FROM "People" WHERE ( "Name" = @Name ) ORDER BY "Id" DESC LIMIT 10 ;"#
        );
        assert_eq!(
            GENERIC.create(RequestKind::QueryAll, &args).unwrap(),
            r#"SELECT "Id", "Name" FROM "People" ORDER BY "Id" DESC LIMIT 10 ;"#
        );
    }

    #[test]
    fn query_all_columns_from_metadata() {
        let db_fields = people();
        assert_eq!(
            POSTGRES
                .create(
                    RequestKind::QueryAll,
                    &StatementArgs {
                        table: "public.people",
                        db_fields: Some(&db_fields),
                        ..Default::default()
                    }
                )
                .unwrap(),
            r#"SELECT "Id", "Name", "Age", "Updated" FROM "public"."people" ;"#
        );
        let qualifiers: Fields = ["Nope"].into();
        assert_eq!(
            error(
                &POSTGRES,
                RequestKind::Query,
                &StatementArgs {
                    table: "people",
                    db_fields: Some(&db_fields),
                    qualifiers: &qualifiers,
                    ..Default::default()
                }
            ),
            StatementError::InvalidQualifiers(vec!["Nope".into()])
        );
    }

    #[test]
    fn aggregates() {
        let field = Field::new("Age");
        let qualifiers: Fields = ["Name"].into();
        assert_eq!(
            SQLSERVER
                .create(
                    RequestKind::CountAll,
                    &StatementArgs {
                        table: "People",
                        ..Default::default()
                    }
                )
                .unwrap(),
            "SELECT COUNT_BIG (*) AS [CountValue] FROM [People] ;"
        );
        assert_eq!(
            SQLITE
                .create(
                    RequestKind::Sum,
                    &StatementArgs {
                        table: "People",
                        field: Some(&field),
                        qualifiers: &qualifiers,
                        ..Default::default()
                    }
                )
                .unwrap(),
            r#"SELECT TOTAL ("Age") AS "SumValue" FROM "People" WHERE ( "Name" = @Name ) ;"#
        );
        assert_eq!(
            GENERIC
                .create(
                    RequestKind::AverageAll,
                    &StatementArgs {
                        table: "People",
                        field: Some(&field),
                        qualifiers: &qualifiers,
                        ..Default::default()
                    }
                )
                .unwrap(),
            r#"SELECT AVG ("Age") AS "AverageValue" FROM "People" ;"#
        );
        assert_eq!(
            error(
                &GENERIC,
                RequestKind::MaxAll,
                &StatementArgs {
                    table: "People",
                    ..Default::default()
                }
            ),
            StatementError::ArgumentNull("field")
        );
    }

    #[test]
    fn quoting_is_escaped() {
        let fields: Fields = ["we]ird"].into();
        assert_eq!(
            SQLSERVER
                .create(
                    RequestKind::Insert,
                    &StatementArgs {
                        table: "T",
                        fields: &fields,
                        ..Default::default()
                    }
                )
                .unwrap(),
            "INSERT INTO [T] ( [we]]ird] ) VALUES ( @we]ird ) ;"
        );
    }
}
