// 测试用内存存储
// 以"暂存-提交"模拟事务语义：插入先进暂存区，提交时合入共享状态，
// 回滚时丢弃暂存并撤销座位递减。供匹配/登记的单元测试使用。

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::database::entities::{
    Activity, Group, Member, NewActivity, NewGroup, NewMember, NewVehicle, Vehicle,
};
use crate::database::store::{CandidateQuery, CandidateRow, RideStore, RideTx, StoreError};

#[derive(Debug, Default)]
pub struct MemState {
    pub activities: Vec<Activity>,
    pub vehicles: Vec<Vehicle>,
    pub groups: Vec<Group>,
    pub members: Vec<Member>,
}

/// 强制某个操作失败，用来验证整单回滚
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertActivity,
    InsertVehicle,
    InsertGroup,
    InsertMember,
    FindCandidates,
}

#[derive(Clone, Default)]
pub struct MemStore {
    state: Arc<Mutex<MemState>>,
    fail_point: Arc<Mutex<Option<FailPoint>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 下一次命中该操作时返回错误（一次性）
    pub async fn set_fail_point(&self, point: FailPoint) {
        *self.fail_point.lock().await = Some(point);
    }

    pub async fn state(&self) -> MutexGuard<'_, MemState> {
        self.state.lock().await
    }

    async fn trip(&self, point: FailPoint) -> Result<(), StoreError> {
        let mut armed = self.fail_point.lock().await;
        if *armed == Some(point) {
            armed.take();
            return Err(StoreError::Backend(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

impl RideStore for MemStore {
    type Tx = MemTx;

    async fn begin(&self) -> Result<MemTx, StoreError> {
        Ok(MemTx {
            store: self.clone(),
            staged: MemState::default(),
            seat_undo: Vec::new(),
        })
    }
}

pub struct MemTx {
    store: MemStore,
    staged: MemState,
    /// 已对共享状态生效的座位递减，回滚时恢复
    seat_undo: Vec<(String, i32)>,
}

impl RideTx for MemTx {
    async fn insert_activity(&mut self, activity: &NewActivity) -> Result<String, StoreError> {
        self.store.trip(FailPoint::InsertActivity).await?;
        let id = Uuid::new_v4().to_string();
        self.staged.activities.push(Activity {
            id: id.clone(),
            user_id: activity.user_id.clone(),
            role: activity.role,
            start_place: activity.start_place.clone(),
            start_lat: activity.start_lat,
            start_lon: activity.start_lon,
            end_place: activity.end_place.clone(),
            end_lat: activity.end_lat,
            end_lon: activity.end_lon,
            departure_time: activity.departure_time,
            vehicle_type: activity.vehicle_type.clone(),
            price: activity.price,
            available_seats: activity.available_seats,
        });
        Ok(id)
    }

    async fn insert_vehicle(&mut self, vehicle: &NewVehicle) -> Result<String, StoreError> {
        self.store.trip(FailPoint::InsertVehicle).await?;
        let id = Uuid::new_v4().to_string();
        self.staged.vehicles.push(Vehicle {
            id: id.clone(),
            user_id: vehicle.user_id.clone(),
            model: vehicle.model.clone(),
            license_plate: vehicle.license_plate.clone(),
            color: vehicle.color.clone(),
        });
        Ok(id)
    }

    async fn insert_group(&mut self, group: &NewGroup) -> Result<String, StoreError> {
        self.store.trip(FailPoint::InsertGroup).await?;
        let id = Uuid::new_v4().to_string();
        self.staged.groups.push(Group {
            id: id.clone(),
            activity_id: group.activity_id.clone(),
            start_time: group.start_time,
            vehicle_type: group.vehicle_type.clone(),
            vehicle_id: group.vehicle_id.clone(),
        });
        Ok(id)
    }

    async fn insert_member(&mut self, member: &NewMember) -> Result<String, StoreError> {
        self.store.trip(FailPoint::InsertMember).await?;
        let id = Uuid::new_v4().to_string();
        self.staged.members.push(Member {
            id: id.clone(),
            activity_id: member.activity_id.clone(),
            user_id: member.user_id.clone(),
            group_id: member.group_id.clone(),
            role: member.role,
        });
        Ok(id)
    }

    async fn find_candidates(
        &mut self,
        query: &CandidateQuery,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        self.store.trip(FailPoint::FindCandidates).await?;

        let state = self.store.state.lock().await;
        let mut rows = Vec::new();

        // 只读已提交状态，按插入顺序遍历，排名并列时结果可复现
        for activity in &state.activities {
            if activity.role != query.role
                || activity.user_id == query.exclude_user_id
                || !query.window.contains(activity.departure_time)
            {
                continue;
            }
            let start_ok = activity.start_lat >= query.pickup_box.min_lat
                && activity.start_lat <= query.pickup_box.max_lat
                && activity.start_lon >= query.pickup_box.min_lng
                && activity.start_lon <= query.pickup_box.max_lng;
            let end_ok = activity.end_lat >= query.destination_box.min_lat
                && activity.end_lat <= query.destination_box.max_lat
                && activity.end_lon >= query.destination_box.min_lng
                && activity.end_lon <= query.destination_box.max_lng;
            if !start_ok || !end_ok {
                continue;
            }
            if let Some(wanted) = &query.vehicle_type {
                if activity
                    .vehicle_type
                    .as_ref()
                    .is_some_and(|vt| vt != wanted)
                {
                    continue;
                }
            }
            if let Some(min_seats) = query.min_seats {
                if activity.available_seats.is_some_and(|s| s < min_seats) {
                    continue;
                }
            }

            let member = state
                .members
                .iter()
                .find(|m| m.activity_id == activity.id);
            let group = member
                .and_then(|m| m.group_id.as_ref())
                .and_then(|gid| state.groups.iter().find(|g| &g.id == gid));
            let vehicle = group.and_then(|g| state.vehicles.iter().find(|v| v.id == g.vehicle_id));

            rows.push(CandidateRow {
                activity_id: activity.id.clone(),
                user_id: activity.user_id.clone(),
                role: activity.role.as_str().to_string(),
                start_place: activity.start_place.clone(),
                start_lat: activity.start_lat,
                start_lon: activity.start_lon,
                end_place: activity.end_place.clone(),
                end_lat: activity.end_lat,
                end_lon: activity.end_lon,
                departure_time: activity.departure_time,
                vehicle_type: activity.vehicle_type.clone(),
                price: activity.price,
                available_seats: activity.available_seats,
                group_id: group.map(|g| g.id.clone()),
                vehicle_id: vehicle.map(|v| v.id.clone()),
                vehicle_model: vehicle.map(|v| v.model.clone()),
                vehicle_plate: vehicle.map(|v| v.license_plate.clone()),
                vehicle_color: vehicle.map(|v| v.color.clone()),
            });

            if rows.len() as i64 >= query.limit {
                break;
            }
        }

        Ok(rows)
    }

    async fn bind_member_to_group(
        &mut self,
        group_id: &str,
        member_id: &str,
        seats: i32,
    ) -> Result<bool, StoreError> {
        let mut state = self.store.state.lock().await;

        let Some(activity_id) = state
            .groups
            .iter()
            .find(|g| g.id == group_id)
            .map(|g| g.activity_id.clone())
        else {
            return Ok(false);
        };
        let Some(activity) = state.activities.iter_mut().find(|a| a.id == activity_id) else {
            return Ok(false);
        };

        // 座位的比较-递减立即对共享状态生效，模拟行锁下的竞争裁决
        match activity.available_seats {
            None => {}
            Some(remaining) if remaining >= seats => {
                activity.available_seats = Some(remaining - seats);
                self.seat_undo.push((activity_id, seats));
            }
            Some(_) => return Ok(false),
        }
        drop(state);

        if let Some(member) = self.staged.members.iter_mut().find(|m| m.id == member_id) {
            member.group_id = Some(group_id.to_string());
        } else if let Some(member) = self
            .store
            .state
            .lock()
            .await
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
        {
            member.group_id = Some(group_id.to_string());
        }

        Ok(true)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let mut state = self.store.state.lock().await;
        state.activities.append(&mut self.staged.activities);
        state.vehicles.append(&mut self.staged.vehicles);
        state.groups.append(&mut self.staged.groups);
        state.members.append(&mut self.staged.members);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        let mut state = self.store.state.lock().await;
        for (activity_id, seats) in self.seat_undo {
            if let Some(activity) = state.activities.iter_mut().find(|a| a.id == activity_id) {
                if let Some(remaining) = activity.available_seats {
                    activity.available_seats = Some(remaining + seats);
                }
            }
        }
        Ok(())
    }
}
