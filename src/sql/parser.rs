//! DDL parser collecting tables, column nullability and foreign keys.

use std::collections::HashSet;

use thiserror::Error;

use super::dialect::Dialect;
use super::lexer::{Lexer, Token};
use super::name::TableName;

#[derive(Debug, Error, PartialEq)]
pub enum SqlParseError {
    #[error("Expected {expected}, found {found:?}")]
    Expected {
        expected: &'static str,
        found: Token,
    },
    #[error("Unexpected end of input in table {0}")]
    UnexpectedEof(String),
}

/// A table declared by `CREATE TABLE`.
///
/// Identifiers are stored folded the way the dialect folds them.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    pub name: TableName,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub nullable: bool,
}

/// A foreign key from `table(columns)` to `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyDef {
    pub table: TableName,
    pub columns: Vec<String>,
    pub target: TableName,
}

/// Parse result: every table and every foreign key found in the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ddl {
    /// Concrete dialect the names were folded with.
    pub dialect: Dialect,
    pub tables: Vec<TableDef>,
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// Parse a DDL script or dump; `Dialect::Auto` is detected from the input.
pub fn parse_ddl(input: &str, dialect: Dialect) -> Result<Ddl, SqlParseError> {
    let tokens = Lexer::new(input).tokenize();
    Parser::new(tokens, dialect.resolve(input)).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    dialect: Dialect,
}

impl Parser {
    fn new(tokens: Vec<Token>, dialect: Dialect) -> Self {
        Self {
            tokens,
            pos: 0,
            dialect,
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume an identifier, folded per dialect.
    fn take_ident(&mut self) -> Option<String> {
        let (text, quoted) = self.current().ident()?;
        let folded = self.dialect.fold_ident(text, quoted);
        self.advance();
        Some(folded)
    }

    fn parse(&mut self) -> Result<Ddl, SqlParseError> {
        let mut ddl = Ddl {
            dialect: self.dialect,
            ..Ddl::default()
        };

        while self.current() != &Token::Eof {
            match self.current() {
                Token::Create => {
                    self.advance();
                    // CREATE [TEMPORARY | UNLOGGED ...] TABLE
                    while self.current().name().is_some() {
                        self.advance();
                    }
                    if self.eat(&Token::Table) {
                        self.parse_create_table(&mut ddl)?;
                    } else {
                        self.skip_statement();
                    }
                }
                Token::Alter => {
                    self.advance();
                    if self.eat(&Token::Table) {
                        self.parse_alter_table(&mut ddl)?;
                    } else {
                        self.skip_statement();
                    }
                }
                _ => self.skip_statement(),
            }
        }

        Ok(ddl)
    }

    fn skip_if_not_exists(&mut self) {
        if self.eat(&Token::If) {
            self.eat(&Token::Not);
            self.eat(&Token::Exists);
        }
    }

    /// `name`, `schema.name` or `catalog.schema.name`; anything else is not a
    /// table reference.
    fn parse_qualified_name(&mut self) -> Option<TableName> {
        let mut segments = vec![self.take_ident()?];
        while self.current() == &Token::Dot {
            self.advance();
            match self.take_ident() {
                Some(segment) => segments.push(segment),
                None => break,
            }
        }

        let name = segments.pop()?;
        Some(TableName::new(segments.pop(), name))
    }

    fn parse_create_table(&mut self, ddl: &mut Ddl) -> Result<(), SqlParseError> {
        self.skip_if_not_exists();

        let Some(name) = self.parse_qualified_name() else {
            self.skip_statement();
            return Ok(());
        };
        // CREATE TABLE ... AS SELECT, LIKE, PARTITION OF
        if !self.eat(&Token::LParen) {
            self.skip_statement();
            return Ok(());
        }

        let mut table = TableDef {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
        };

        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Comma => self.advance(),
                Token::Eof => return Err(SqlParseError::UnexpectedEof(table.name.to_string())),
                Token::Ident(_) | Token::Quoted(_) => self.parse_column(&mut table, ddl)?,
                _ => self.parse_table_constraint(&mut table.primary_key, &table.name, ddl)?,
            }
        }

        // Table options: ENGINE=..., WITH (...), INHERITS (...)
        self.skip_statement();
        ddl.tables.push(table);
        Ok(())
    }

    fn parse_column(&mut self, table: &mut TableDef, ddl: &mut Ddl) -> Result<(), SqlParseError> {
        let Some(name) = self.take_ident() else {
            return Ok(());
        };

        let mut nullable = true;

        loop {
            match self.current() {
                Token::Comma | Token::RParen | Token::Eof => break,
                Token::Not => {
                    self.advance();
                    if self.eat(&Token::Null) {
                        nullable = false;
                    }
                }
                Token::Primary => {
                    self.advance();
                    self.eat(&Token::Key);
                    nullable = false;
                    table.primary_key.push(name.clone());
                }
                Token::References => {
                    self.advance();
                    let target = self.parse_reference()?;
                    ddl.foreign_keys.push(ForeignKeyDef {
                        table: table.name.clone(),
                        columns: vec![name.clone()],
                        target,
                    });
                }
                Token::LParen => self.skip_parenthesized(),
                // Type words, DEFAULT, UNIQUE, CHECK, CONSTRAINT names, ON actions
                _ => self.advance(),
            }
        }

        table.columns.push(ColumnDef { name, nullable });
        Ok(())
    }

    /// Table-level constraint inside `CREATE TABLE` or after `ALTER TABLE ... ADD`.
    fn parse_table_constraint(
        &mut self,
        primary_key: &mut Vec<String>,
        table: &TableName,
        ddl: &mut Ddl,
    ) -> Result<(), SqlParseError> {
        if self.eat(&Token::Constraint) && self.current().name().is_some() {
            self.advance();
        }

        match self.current() {
            Token::Primary => {
                self.advance();
                self.eat(&Token::Key);
                primary_key.extend(self.parse_column_list());
            }
            Token::Foreign => {
                self.advance();
                self.eat(&Token::Key);
                // MySQL allows an index name here
                if self.current().name().is_some() {
                    self.advance();
                }
                let columns = self.parse_column_list();
                if self.eat(&Token::References) {
                    let target = self.parse_reference()?;
                    ddl.foreign_keys.push(ForeignKeyDef {
                        table: table.clone(),
                        columns,
                        target,
                    });
                }
            }
            _ => {}
        }

        self.skip_clause();
        Ok(())
    }

    fn parse_alter_table(&mut self, ddl: &mut Ddl) -> Result<(), SqlParseError> {
        self.skip_if_not_exists();
        self.eat(&Token::Only);

        let Some(table) = self.parse_qualified_name() else {
            self.skip_statement();
            return Ok(());
        };

        let mut primary_key = Vec::new();
        loop {
            match self.current() {
                Token::Semicolon | Token::Eof => break,
                Token::Comma => self.advance(),
                Token::Add => {
                    self.advance();
                    self.parse_table_constraint(&mut primary_key, &table, ddl)?;
                }
                _ => self.skip_clause(),
            }
        }
        self.skip_statement();

        if !primary_key.is_empty() {
            if let Some(index) = ddl.position(&table) {
                ddl.tables[index].primary_key.extend(primary_key);
            }
        }
        Ok(())
    }

    /// `table [(col, ...)]` after REFERENCES; the referenced columns are not needed.
    fn parse_reference(&mut self) -> Result<TableName, SqlParseError> {
        let Some(target) = self.parse_qualified_name() else {
            return Err(SqlParseError::Expected {
                expected: "referenced table",
                found: self.current().clone(),
            });
        };
        self.parse_column_list();
        Ok(target)
    }

    fn parse_column_list(&mut self) -> Vec<String> {
        let mut columns = Vec::new();
        if !self.eat(&Token::LParen) {
            return columns;
        }

        let dialect = self.dialect;
        loop {
            match self.current() {
                Token::RParen => {
                    self.advance();
                    break;
                }
                Token::Eof => break,
                Token::LParen => self.skip_parenthesized(),
                token => {
                    // Skip ASC/DESC and prefix lengths after the name
                    if let Some((name, quoted)) = token.ident() {
                        let prev_is_separator = self.pos == 0
                            || matches!(self.tokens[self.pos - 1], Token::LParen | Token::Comma);
                        if prev_is_separator {
                            columns.push(dialect.fold_ident(name, quoted));
                        }
                    }
                    self.advance();
                }
            }
        }

        columns
    }

    fn skip_parenthesized(&mut self) {
        if !self.eat(&Token::LParen) {
            return;
        }
        let mut depth = 1;
        while depth > 0 {
            match self.current() {
                Token::LParen => depth += 1,
                Token::RParen => depth -= 1,
                Token::Eof => return,
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the next top-level `,`, `)` or `;`.
    fn skip_clause(&mut self) {
        while !matches!(
            self.current(),
            Token::Comma | Token::RParen | Token::Semicolon | Token::Eof
        ) {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
    }

    fn skip_statement(&mut self) {
        while !matches!(self.current(), Token::Semicolon | Token::Eof) {
            if self.current() == &Token::LParen {
                self.skip_parenthesized();
            } else {
                self.advance();
            }
        }
        self.eat(&Token::Semicolon);
    }
}

impl Ddl {
    /// Resolve a referenced name to a declared table.
    ///
    /// An exact match wins. A name qualified with the dialect's default schema
    /// (`public.users`, `dbo.users`) also matches an unqualified declaration,
    /// and an unqualified reference matches a table of the same name in a
    /// single schema, or in the default schema when there are several.
    pub fn resolve_table(&self, reference: &TableName) -> Option<&TableDef> {
        self.position(reference).map(|index| &self.tables[index])
    }

    fn position(&self, reference: &TableName) -> Option<usize> {
        let dialect = self.dialect;
        let same_schema = |index: usize, schema: Option<&str>| {
            match (self.tables[index].name.schema.as_deref(), schema) {
                (Some(a), Some(b)) => dialect.ident_eq(a, b),
                (None, None) => true,
                _ => false,
            }
        };
        let is_default = |schema: &str| {
            dialect
                .default_schema()
                .is_some_and(|default| dialect.ident_eq(schema, default))
        };

        let named: Vec<usize> = (0..self.tables.len())
            .filter(|&index| dialect.ident_eq(&self.tables[index].name.name, &reference.name))
            .collect();

        if let Some(&exact) = named
            .iter()
            .find(|&&index| same_schema(index, reference.schema.as_deref()))
        {
            return Some(exact);
        }

        match reference.schema.as_deref() {
            Some(schema) if is_default(schema) => {
                named.into_iter().find(|&index| same_schema(index, None))
            }
            Some(_) => None,
            None => match named.as_slice() {
                [only] => Some(*only),
                several => several.iter().copied().find(|&index| {
                    self.tables[index]
                        .name
                        .schema
                        .as_deref()
                        .is_some_and(|schema| is_default(schema))
                }),
            },
        }
    }

    /// Nullable unless declared `NOT NULL` or part of the primary key.
    pub fn is_nullable(&self, table: &TableDef, column: &str) -> bool {
        let dialect = self.dialect;
        table
            .columns
            .iter()
            .find(|c| dialect.ident_eq(&c.name, column))
            .is_some_and(|c| c.nullable)
            && !table
                .primary_key
                .iter()
                .any(|pk| dialect.ident_eq(pk, column))
    }

    /// Declared table names in canonical form and declaration order, without
    /// duplicates.
    pub fn table_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tables
            .iter()
            .map(|t| t.name.to_string())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Ddl {
        parse_ddl(sql, Dialect::Generic).unwrap()
    }

    fn name(schema: Option<&str>, table: &str) -> TableName {
        TableName::new(schema.map(str::to_string), table)
    }

    #[test]
    fn test_parse_simple_table() {
        let sql = r#"
            CREATE TABLE users (
                id INT PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                nickname TEXT NULL
            );
        "#;

        let ddl = parse(sql);
        assert_eq!(ddl.tables.len(), 1);

        let users = &ddl.tables[0];
        assert_eq!(users.name, name(None, "users"));
        assert_eq!(users.primary_key, vec!["id"]);
        assert!(!ddl.is_nullable(users, "id"));
        assert!(!ddl.is_nullable(users, "email"));
        assert!(ddl.is_nullable(users, "nickname"));
    }

    #[test]
    fn test_inline_reference() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (
                id INT PRIMARY KEY,
                user_id INT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                coupon_id INT REFERENCES coupons
            );
        "#;

        let ddl = parse(sql);
        assert_eq!(
            ddl.foreign_keys,
            vec![
                ForeignKeyDef {
                    table: name(None, "orders"),
                    columns: vec!["user_id".to_string()],
                    target: name(None, "users"),
                },
                ForeignKeyDef {
                    table: name(None, "orders"),
                    columns: vec!["coupon_id".to_string()],
                    target: name(None, "coupons"),
                },
            ]
        );
    }

    #[test]
    fn test_table_level_foreign_key() {
        let sql = r#"
            CREATE TABLE IF NOT EXISTS `line_items` (
                `order_id` INT NOT NULL,
                `product_id` INT DEFAULT NULL,
                PRIMARY KEY (`order_id`, `product_id`),
                KEY `idx_product` (`product_id`),
                CONSTRAINT `fk_order` FOREIGN KEY (`order_id`) REFERENCES `orders` (`id`),
                CONSTRAINT `fk_product` FOREIGN KEY (`product_id`) REFERENCES `products` (`id`) ON DELETE SET NULL
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
        "#;

        let ddl = parse_ddl(sql, Dialect::Auto).unwrap();
        assert_eq!(ddl.dialect, Dialect::MySQL);

        let items = &ddl.tables[0];
        assert_eq!(items.name, name(None, "line_items"));
        assert_eq!(items.columns.len(), 2);
        assert_eq!(items.primary_key, vec!["order_id", "product_id"]);

        assert_eq!(ddl.foreign_keys.len(), 2);
        assert_eq!(ddl.foreign_keys[1].target, name(None, "products"));
        assert_eq!(ddl.foreign_keys[1].columns, vec!["product_id"]);
    }

    #[test]
    fn test_pg_dump_alter_table() {
        let sql = r#"
            CREATE TABLE public.users (
                id integer NOT NULL,
                manager_id integer
            );
            CREATE TABLE public.orders (
                id integer NOT NULL,
                user_id integer,
                created timestamp with time zone DEFAULT now()
            );
            ALTER TABLE ONLY public.users
                ADD CONSTRAINT users_pkey PRIMARY KEY (id);
            ALTER TABLE ONLY public.orders
                ADD CONSTRAINT orders_user_id_fkey FOREIGN KEY (user_id) REFERENCES public.users(id);
            ALTER TABLE ONLY public.users
                ADD CONSTRAINT users_manager_fkey FOREIGN KEY (manager_id) REFERENCES public.users(id);
            ALTER TABLE public.orders OWNER TO postgres;
        "#;

        let ddl = parse_ddl(sql, Dialect::PostgreSQL).unwrap();
        assert_eq!(ddl.table_names(), vec!["public.users", "public.orders"]);
        assert_eq!(ddl.tables[0].primary_key, vec!["id"]);
        assert_eq!(ddl.tables[1].columns.len(), 3);

        assert_eq!(ddl.foreign_keys.len(), 2);
        assert_eq!(ddl.foreign_keys[0].table.to_string(), "public.orders");
        assert_eq!(ddl.foreign_keys[0].target.to_string(), "public.users");
        assert_eq!(ddl.foreign_keys[1].table.to_string(), "public.users");
    }

    #[test]
    fn test_alter_table_multiple_adds() {
        let sql = r#"
            CREATE TABLE a (id INT, b_id INT, c_id INT);
            ALTER TABLE a
                ADD FOREIGN KEY (b_id) REFERENCES b (id),
                ADD CONSTRAINT fk_c FOREIGN KEY (c_id) REFERENCES c (id);
        "#;

        let ddl = parse(sql);
        let targets: Vec<&str> = ddl.foreign_keys.iter().map(|f| f.target.name.as_str()).collect();
        assert_eq!(targets, vec!["b", "c"]);
    }

    #[test]
    fn test_other_statements_skipped() {
        let sql = r#"
            SET statement_timeout = 0;
            CREATE INDEX idx ON t (a);
            CREATE VIEW v AS SELECT * FROM t;
            INSERT INTO t VALUES (1, 'x;y');
            CREATE TABLE t (a INT CHECK (a > 0));
        "#;

        let ddl = parse(sql);
        assert_eq!(ddl.table_names(), vec!["t"]);
        assert_eq!(ddl.tables[0].columns.len(), 1);
    }

    #[test]
    fn test_missing_reference_target() {
        let err = parse_ddl("CREATE TABLE t (a INT REFERENCES (id));", Dialect::Generic).unwrap_err();
        assert!(matches!(err, SqlParseError::Expected { .. }));
    }

    #[test]
    fn test_unterminated_table() {
        let err = parse_ddl("CREATE TABLE t (a INT", Dialect::Generic).unwrap_err();
        assert_eq!(err, SqlParseError::UnexpectedEof("t".to_string()));
    }

    #[test]
    fn test_unquoted_names_fold_to_lower_case() {
        let sql = r#"
            CREATE TABLE Users (Id INT PRIMARY KEY, Email TEXT NOT NULL);
            CREATE TABLE "Audit" (UserId INT REFERENCES USERS (ID));
        "#;

        let ddl = parse_ddl(sql, Dialect::PostgreSQL).unwrap();
        assert_eq!(ddl.table_names(), vec!["users", "Audit"]);
        assert_eq!(ddl.tables[0].primary_key, vec!["id"]);
        assert!(!ddl.is_nullable(&ddl.tables[0], "email"));
        assert_eq!(ddl.foreign_keys[0].columns, vec!["userid"]);
        assert_eq!(ddl.foreign_keys[0].target, name(None, "users"));
    }

    #[test]
    fn test_quoted_names_keep_case() {
        let ddl = parse_ddl(r#"CREATE TABLE "Users" (id INT);"#, Dialect::PostgreSQL).unwrap();

        assert!(ddl.resolve_table(&name(None, "Users")).is_some());
        assert!(ddl.resolve_table(&name(None, "users")).is_none());
    }

    #[test]
    fn test_case_insensitive_dialect_keeps_declared_spelling() {
        let sql = r#"
            CREATE TABLE `Users` (`Id` INT NOT NULL, PRIMARY KEY (`Id`));
            CREATE TABLE `orders` (`user_id` INT, FOREIGN KEY (`user_id`) REFERENCES `users` (`id`));
        "#;

        let ddl = parse_ddl(sql, Dialect::MySQL).unwrap();
        assert_eq!(ddl.table_names(), vec!["Users", "orders"]);

        let target = ddl.resolve_table(&ddl.foreign_keys[0].target).unwrap();
        assert_eq!(target.name, name(None, "Users"));
        assert!(!ddl.is_nullable(target, "ID"));
    }

    #[test]
    fn test_resolve_unqualified_reference() {
        let ddl = parse("CREATE TABLE app.users (id INT); CREATE TABLE log (id INT);");

        let resolved = |reference: TableName| ddl.resolve_table(&reference).map(|t| t.name.to_string());
        assert_eq!(resolved(name(None, "users")).as_deref(), Some("app.users"));
        assert_eq!(resolved(name(None, "log")).as_deref(), Some("log"));
        assert_eq!(resolved(name(None, "missing")), None);
    }

    #[test]
    fn test_default_schema_reference_resolves_bare_table() {
        let sql = r#"
            CREATE TABLE users (id INT PRIMARY KEY);
            CREATE TABLE orders (id INT PRIMARY KEY, user_id INT);
            ALTER TABLE public.orders ADD FOREIGN KEY (user_id) REFERENCES public.users (id);
        "#;

        let ddl = parse_ddl(sql, Dialect::PostgreSQL).unwrap();
        let fk = &ddl.foreign_keys[0];
        assert_eq!(ddl.resolve_table(&fk.table).unwrap().name, name(None, "orders"));
        assert_eq!(ddl.resolve_table(&fk.target).unwrap().name, name(None, "users"));

        // Other schemas stay distinct
        assert!(ddl.resolve_table(&name(Some("audit"), "users")).is_none());
    }

    #[test]
    fn test_unqualified_reference_prefers_default_schema() {
        let sql = "CREATE TABLE [dbo].[users] (id INT); CREATE TABLE [archive].[users] (id INT);";

        let ddl = parse_ddl(sql, Dialect::SqlServer).unwrap();
        let users = ddl.resolve_table(&name(None, "USERS")).unwrap();
        assert_eq!(users.name, name(Some("dbo"), "users"));
    }

    #[test]
    fn test_alter_primary_key_on_default_schema_name() {
        let sql = r#"
            CREATE TABLE accounts (id INT);
            ALTER TABLE ONLY public.accounts ADD CONSTRAINT accounts_pkey PRIMARY KEY (id);
        "#;

        let ddl = parse_ddl(sql, Dialect::PostgreSQL).unwrap();
        assert_eq!(ddl.tables[0].primary_key, vec!["id"]);
    }

    #[test]
    fn test_quoted_dotted_table_name() {
        let ddl = parse_ddl(r#"CREATE TABLE app."x.y" (id INT);"#, Dialect::PostgreSQL).unwrap();

        assert_eq!(ddl.tables[0].name, name(Some("app"), "x.y"));
        assert_eq!(ddl.table_names(), vec![r#"app."x.y""#]);
    }
}
