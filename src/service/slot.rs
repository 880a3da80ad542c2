use crate::database::slot::SlotRepository;
use crate::error::app_error::AppError;
use crate::models::slot::{BulkSlotRequest, ParkingSlot, SlotCreationResult, SlotStatus, normalize_slot_no};
use std::collections::HashSet;
use tracing::{info, warn};
use uuid::Uuid;

pub struct SlotService<'a, R> {
    repository: &'a R,
}

impl<'a, R> SlotService<'a, R>
where
    R: SlotRepository + Sync,
{
    pub fn new(repository: &'a R) -> Self {
        SlotService { repository }
    }

    pub async fn list_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        self.repository.list_slots().await
    }

    pub async fn list_available_slots(&self) -> Result<Vec<ParkingSlot>, AppError> {
        self.repository.list_available_slots().await
    }

    pub async fn get_slot(&self, id: &Uuid) -> Result<ParkingSlot, AppError> {
        self.repository.get_slot_by_id(id).await?.ok_or_else(|| AppError::not_found("Slot not found"))
    }

    /// Creates every slot it can and reports the rest as skipped. Existing
    /// slot numbers never fail the batch.
    pub async fn create_slots(&self, request: &BulkSlotRequest) -> Result<Vec<SlotCreationResult>, AppError> {
        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(request.slots.len());

        for spec in &request.slots {
            let slot_no = normalize_slot_no(&spec.slot_no);
            if slot_no.is_empty() {
                results.push(SlotCreationResult::skipped(spec.slot_no.clone(), "slotNo is required"));
                continue;
            }
            if !seen.insert(slot_no.clone()) {
                results.push(SlotCreationResult::skipped(slot_no, "Duplicate entry in request"));
                continue;
            }

            match self.repository.create_slot(&slot_no).await? {
                Some(slot) => results.push(SlotCreationResult::created(&slot)),
                None => results.push(SlotCreationResult::skipped(slot_no, "Slot already exists")),
            }
        }

        let created = results.iter().filter(|r| r.id.is_some()).count();
        info!(requested = request.slots.len(), created, "bulk slot creation finished");
        Ok(results)
    }

    pub async fn set_slot_status(&self, id: &Uuid, status: SlotStatus) -> Result<ParkingSlot, AppError> {
        let slot = self
            .repository
            .set_slot_status(id, status)
            .await?
            .ok_or_else(|| AppError::not_found("Slot not found"))?;
        warn!(slot_id = %slot.id, slot_no = %slot.slot_no, status = %status, "slot status overridden");
        Ok(slot)
    }
}
