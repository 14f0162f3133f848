//! Layout of the remote post table. Every post is one row keyed by (partition_key, row_key);
//! coordinates are kept as text with three decimal places.
use crate::datastore::structs::{Post, DEFAULT_AUTHOR};
use diesel::sql_types::{Nullable, Text};

/// One row of the post table, as diesel loads it.
#[derive(QueryableByName, Debug, Clone, PartialEq)]
pub struct TableRow {
    #[sql_type = "Text"]
    pub partition_key: String,
    #[sql_type = "Text"]
    pub row_key: String,
    #[sql_type = "Text"]
    pub text: String,
    #[sql_type = "Text"]
    pub author: String,
    #[sql_type = "Nullable<Text>"]
    pub latitude: Option<String>,
    #[sql_type = "Nullable<Text>"]
    pub longitude: Option<String>,
}

impl From<Post> for TableRow {
    fn from(post: Post) -> Self {
        Self {
            partition_key: post.partition,
            row_key: post.id,
            text: post.text,
            author: post.author,
            latitude: post.latitude.map(coordinate_cell),
            longitude: post.longitude.map(coordinate_cell),
        }
    }
}

impl From<TableRow> for Post {
    fn from(row: TableRow) -> Self {
        Self {
            id: row.row_key,
            text: row.text,
            author: if row.author.is_empty() {
                DEFAULT_AUTHOR.to_owned()
            } else {
                row.author
            },
            latitude: parse_coordinate(row.latitude.as_deref()),
            longitude: parse_coordinate(row.longitude.as_deref()),
            partition: row.partition_key,
        }
    }
}

fn coordinate_cell(value: f64) -> String {
    format!("{:.3}", value)
}

/// Empty or unparseable cells read back as no coordinate.
fn parse_coordinate(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .filter(|c| !c.is_empty())
        .and_then(|c| c.parse().ok())
}

/// SQL for one post table. The name must already be a validated identifier.
pub struct TableSql {
    pub create: String,
    pub insert: String,
    pub list: String,
    pub delete: String,
}

impl TableSql {
    pub fn new(table_name: &str) -> Self {
        Self {
            create: format!(
                r#"CREATE TABLE IF NOT EXISTS "{}" (
                    partition_key TEXT NOT NULL,
                    row_key TEXT NOT NULL,
                    text TEXT NOT NULL,
                    author TEXT NOT NULL,
                    latitude TEXT,
                    longitude TEXT,
                    PRIMARY KEY (partition_key, row_key)
                )"#,
                table_name
            ),
            insert: format!(
                r#"INSERT INTO "{}" (partition_key, row_key, text, author, latitude, longitude)
                VALUES ($1, $2, $3, $4, $5, $6)"#,
                table_name
            ),
            list: format!(
                r#"SELECT partition_key, row_key, text, author, latitude, longitude
                FROM "{}" ORDER BY partition_key, row_key"#,
                table_name
            ),
            delete: format!(r#"DELETE FROM "{}" WHERE row_key = $1"#, table_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datastore::structs::NewPost;

    #[test]
    fn test_coordinates_rounded_to_three_places() {
        let post = NewPost::new(
            "view".to_owned(),
            None,
            Some(-44.67193),
            Some(168.7626),
            None,
        )
        .into_post("1".to_owned());
        let row = TableRow::from(post);
        assert_eq!(row.latitude.as_deref(), Some("-44.672"));
        assert_eq!(row.longitude.as_deref(), Some("168.763"));
        assert_eq!(row.partition_key, "posts");
        assert_eq!(row.row_key, "1");
    }

    #[test]
    fn test_rows_normalize_into_posts() {
        let row = TableRow {
            partition_key: "posts".to_owned(),
            row_key: "99".to_owned(),
            text: "hello".to_owned(),
            author: "".to_owned(),
            latitude: Some("-41.287".to_owned()),
            longitude: Some("".to_owned()),
        };
        let post = Post::from(row);
        assert_eq!(post.id, "99");
        assert_eq!(post.author, "Anonymous");
        assert_eq!(post.latitude, Some(-41.287));
        assert_eq!(post.longitude, None);
    }

    #[test]
    fn test_sql_quotes_table_name() {
        let sql = TableSql::new("GeoPosts");
        assert!(sql.create.contains(r#"CREATE TABLE IF NOT EXISTS "GeoPosts""#));
        assert!(sql.delete.starts_with(r#"DELETE FROM "GeoPosts""#));
    }
}
