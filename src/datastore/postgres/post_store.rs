use crate::datastore::{
    postgres::{
        errors::{table_already_exists, BlockingResp},
        PostgresStore,
    },
    tables::TableRow,
    Post, PostStore,
};
use crate::twoface::Fallible;
use actix_web::web::block;
use async_trait::async_trait;
use diesel::{
    query_dsl::RunQueryDsl,
    sql_query,
    sql_types::{Nullable, Text},
};
use tracing::debug;

#[async_trait]
impl PostStore for PostgresStore {
    async fn ensure_table(&self) -> Fallible<()> {
        let pool = self.pool.clone();
        let sql = self.sql.create.clone();
        block(move || -> Result<(), anyhow::Error> {
            let conn = pool.get()?;
            match sql_query(sql).execute(&conn) {
                Ok(_) => Ok(()),
                Err(e) => {
                    let e = anyhow::Error::from(e);
                    if table_already_exists(&e) {
                        debug!("post table created concurrently");
                        Ok(())
                    } else {
                        Err(e)
                    }
                }
            }
        })
        .await
        .to_resp()
    }

    async fn insert_post(&self, post: Post) -> Fallible<()> {
        let pool = self.pool.clone();
        let sql = self.sql.insert.clone();
        let row = TableRow::from(post);
        block(move || -> Result<(), anyhow::Error> {
            let conn = pool.get()?;
            sql_query(sql)
                .bind::<Text, _>(row.partition_key)
                .bind::<Text, _>(row.row_key)
                .bind::<Text, _>(row.text)
                .bind::<Text, _>(row.author)
                .bind::<Nullable<Text>, _>(row.latitude)
                .bind::<Nullable<Text>, _>(row.longitude)
                .execute(&conn)?;
            Ok(())
        })
        .await
        .to_resp()
    }

    async fn list_posts(&self) -> Fallible<Vec<Post>> {
        let pool = self.pool.clone();
        let sql = self.sql.list.clone();
        let rows = block(move || -> Result<Vec<TableRow>, anyhow::Error> {
            let conn = pool.get()?;
            Ok(sql_query(sql).load::<TableRow>(&conn)?)
        })
        .await
        .to_resp()?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn delete_post(&self, id: &str) -> Fallible<bool> {
        let pool = self.pool.clone();
        let sql = self.sql.delete.clone();
        let id = id.to_owned();
        block(move || -> Result<bool, anyhow::Error> {
            let conn = pool.get()?;
            let removed = sql_query(sql).bind::<Text, _>(id).execute(&conn)?;
            Ok(removed > 0)
        })
        .await
        .to_resp()
    }
}
