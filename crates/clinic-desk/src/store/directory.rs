use std::collections::BTreeMap;
use std::sync::Mutex;

use super::RepositoryError;
use crate::workflows::directory::{DirectoryId, DirectoryRepository, Doctor, StaffMember};

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    doctors: Mutex<BTreeMap<DirectoryId, Doctor>>,
    staff: Mutex<BTreeMap<DirectoryId, StaffMember>>,
}

impl DirectoryRepository for MemoryDirectory {
    fn insert_doctor(&self, doctor: Doctor) -> Result<Doctor, RepositoryError> {
        let mut guard = self.doctors.lock().expect("directory mutex poisoned");
        if guard.contains_key(&doctor.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(doctor.id.clone(), doctor.clone());
        Ok(doctor)
    }

    fn remove_doctor(&self, id: &DirectoryId) -> Result<(), RepositoryError> {
        let mut guard = self.doctors.lock().expect("directory mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn doctors(&self) -> Result<Vec<Doctor>, RepositoryError> {
        let guard = self.doctors.lock().expect("directory mutex poisoned");
        let mut doctors: Vec<Doctor> = guard.values().cloned().collect();
        doctors.sort_by(|a, b| a.doctor_name.cmp(&b.doctor_name));
        Ok(doctors)
    }

    fn insert_staff(&self, member: StaffMember) -> Result<StaffMember, RepositoryError> {
        let mut guard = self.staff.lock().expect("directory mutex poisoned");
        if guard.contains_key(&member.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(member.id.clone(), member.clone());
        Ok(member)
    }

    fn staff(&self) -> Result<Vec<StaffMember>, RepositoryError> {
        let guard = self.staff.lock().expect("directory mutex poisoned");
        let mut staff: Vec<StaffMember> = guard.values().cloned().collect();
        staff.sort_by(|a, b| a.staff_name.cmp(&b.staff_name));
        Ok(staff)
    }
}
