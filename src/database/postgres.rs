// Postgres 存储实现
// 所有写入走同一事务；候选查询用 QueryBuilder 拼接可选谓词

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::database::entities::{NewActivity, NewGroup, NewMember, NewVehicle};
use crate::database::store::{CandidateQuery, CandidateRow, RideStore, RideTx, StoreError};

#[derive(Clone)]
pub struct PgRideStore {
    pool: PgPool,
}

impl PgRideStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RideStore for PgRideStore {
    type Tx = PgRideTx;

    async fn begin(&self) -> Result<PgRideTx, StoreError> {
        Ok(PgRideTx {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgRideTx {
    tx: Transaction<'static, Postgres>,
}

impl RideTx for PgRideTx {
    async fn insert_activity(&mut self, activity: &NewActivity) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO activities (
                id, user_id, role, start_place, start_lat, start_lon,
                end_place, end_lat, end_lon, departure_time,
                vehicle_type, price, available_seats
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(&id)
        .bind(&activity.user_id)
        .bind(activity.role.as_str())
        .bind(&activity.start_place)
        .bind(activity.start_lat)
        .bind(activity.start_lon)
        .bind(&activity.end_place)
        .bind(activity.end_lat)
        .bind(activity.end_lon)
        .bind(activity.departure_time)
        .bind(&activity.vehicle_type)
        .bind(activity.price)
        .bind(activity.available_seats)
        .execute(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_vehicle(&mut self, vehicle: &NewVehicle) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO vehicles (id, user_id, model, license_plate, color)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(&vehicle.user_id)
        .bind(&vehicle.model)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.color)
        .execute(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_group(&mut self, group: &NewGroup) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO ride_groups (id, activity_id, start_time, vehicle_type, vehicle_id)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(&group.activity_id)
        .bind(group.start_time)
        .bind(&group.vehicle_type)
        .bind(&group.vehicle_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn insert_member(&mut self, member: &NewMember) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO members (id, activity_id, user_id, group_id, role)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&id)
        .bind(&member.activity_id)
        .bind(&member.user_id)
        .bind(&member.group_id)
        .bind(member.role.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn find_candidates(
        &mut self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT a.id AS activity_id, a.user_id, a.role,
                   a.start_place, a.start_lat, a.start_lon,
                   a.end_place, a.end_lat, a.end_lon,
                   a.departure_time, a.vehicle_type, a.price, a.available_seats,
                   g.id AS group_id, v.id AS vehicle_id,
                   v.model AS vehicle_model, v.license_plate AS vehicle_plate,
                   v.color AS vehicle_color
            FROM activities a
            LEFT JOIN members m ON m.activity_id = a.id
            LEFT JOIN ride_groups g ON g.id = m.group_id
            LEFT JOIN vehicles v ON v.id = g.vehicle_id
            WHERE a.role = "#,
        );

        qb.push_bind(query.role.as_str());
        qb.push(" AND a.departure_time BETWEEN ");
        qb.push_bind(query.window.start);
        qb.push(" AND ");
        qb.push_bind(query.window.end);
        qb.push(" AND a.user_id <> ");
        qb.push_bind(query.exclude_user_id.clone());

        // 接送点和目的地各自的矩形粗筛
        qb.push(" AND a.start_lat BETWEEN ");
        qb.push_bind(query.pickup_box.min_lat);
        qb.push(" AND ");
        qb.push_bind(query.pickup_box.max_lat);
        qb.push(" AND a.start_lon BETWEEN ");
        qb.push_bind(query.pickup_box.min_lng);
        qb.push(" AND ");
        qb.push_bind(query.pickup_box.max_lng);
        qb.push(" AND a.end_lat BETWEEN ");
        qb.push_bind(query.destination_box.min_lat);
        qb.push(" AND ");
        qb.push_bind(query.destination_box.max_lat);
        qb.push(" AND a.end_lon BETWEEN ");
        qb.push_bind(query.destination_box.min_lng);
        qb.push(" AND ");
        qb.push_bind(query.destination_box.max_lng);

        if let Some(vehicle_type) = &query.vehicle_type {
            qb.push(" AND (a.vehicle_type IS NULL OR a.vehicle_type = ");
            qb.push_bind(vehicle_type.clone());
            qb.push(")");
        }

        if let Some(seats) = query.min_seats {
            qb.push(" AND (a.available_seats IS NULL OR a.available_seats >= ");
            qb.push_bind(seats);
            qb.push(")");
        }

        // 固定排序保证并列分数时的排名可复现
        qb.push(" ORDER BY a.created_at, a.id LIMIT ");
        qb.push_bind(query.limit);

        let rows = qb
            .build_query_as::<CandidateRow>()
            .fetch_all(&mut *self.tx)
            .await?;

        tracing::debug!(candidates = rows.len(), "candidate prefilter query done");

        Ok(rows)
    }

    async fn bind_member_to_group(
        &mut self,
        group_id: &str,
        member_id: &str,
        seats: i32,
    ) -> Result<bool, StoreError> {
        // 座位的比较-递减和成员绑定在同一事务内完成；
        // 并发预订者会在行锁上排队，后到者看到递减后的值而拿不到座位。
        // available_seats 为 NULL 表示不限座位，减 NULL 仍是 NULL。
        let claimed = sqlx::query(
            r#"
            UPDATE activities
            SET available_seats = available_seats - $1
            WHERE id = (SELECT activity_id FROM ride_groups WHERE id = $2)
              AND (available_seats IS NULL OR available_seats >= $1)
            "#,
        )
        .bind(seats)
        .bind(group_id)
        .execute(&mut *self.tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE members SET group_id = $1 WHERE id = $2")
            .bind(group_id)
            .bind(member_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(true)
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
