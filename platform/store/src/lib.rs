//! In-memory employee repository.
//!
//! A single mutex guards the record vector; it is held only for the duration
//! of a scan or mutation, never across I/O. Lookups are linear scans over an
//! ordered sequence, with `id` as the identity field.

use std::sync::{Mutex, MutexGuard, PoisonError};

use entity::Employee;

pub struct EmployeeStore {
    records: Mutex<Vec<Employee>>,
}

impl EmployeeStore {
    pub fn new(records: Vec<Employee>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Store preloaded with the three fixture records used at process start.
    pub fn seeded() -> Self {
        Self::new(vec![
            Employee::new(1, "John Mackenzie", "Manager", 80_000.0),
            Employee::new(2, "Aisha Patel", "Developer", 60_000.0),
            Employee::new(3, "Sam Okafor", "Tester", 50_000.0),
        ])
    }

    /// Read-consistent snapshot of the whole collection.
    pub fn all(&self) -> Vec<Employee> {
        self.lock().clone()
    }

    pub fn get(&self, id: i64) -> Option<Employee> {
        self.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Appends unconditionally; duplicate ids are not rejected here.
    pub fn add(&self, employee: Employee) {
        self.lock().push(employee);
    }

    /// Overwrites `name`, `position` and `salary` of the record matching
    /// `employee.id` in place. Returns false when no record matches.
    pub fn update(&self, employee: &Employee) -> bool {
        let mut records = self.lock();
        match records.iter_mut().find(|e| e.id == employee.id) {
            Some(existing) => {
                existing.name = employee.name.clone();
                existing.position = employee.position.clone();
                existing.salary = employee.salary;
                true
            }
            None => false,
        }
    }

    /// Removes the first record matching `id`. Returns false when absent.
    pub fn delete(&self, id: i64) -> bool {
        let mut records = self.lock();
        match records.iter().position(|e| e.id == id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Looks up `id` and overwrites `name`/`position` with the given values,
    /// returning the updated record. Backs the profile route, which binds
    /// those fields from the query string and headers and writes them back as
    /// a side effect of the read.
    pub fn amend_profile(&self, id: i64, name: &str, position: &str) -> Option<Employee> {
        let mut records = self.lock();
        let record = records.iter_mut().find(|e| e.id == id)?;
        record.name = name.to_string();
        record.position = position.to_string();
        Some(record.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The guarded data is always left consistent, so a poisoned lock is
    // recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, Vec<Employee>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EmployeeStore {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_three_records() {
        let store = EmployeeStore::seeded();
        assert_eq!(store.len(), 3);
        let ids: Vec<i64> = store.all().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn added_records_are_retrievable_by_id() {
        let store = EmployeeStore::seeded();
        let employee = Employee::new(4, "Alex", "Clerk", 40_000.0);
        store.add(employee.clone());
        assert_eq!(store.get(4), Some(employee));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn add_keeps_records_with_duplicate_ids() {
        // Uniqueness is a convention of the seed data; `add` itself never
        // rejects an id that is already present.
        let store = EmployeeStore::seeded();
        store.add(Employee::new(1, "Second John", "Intern", 20_000.0));
        assert_eq!(store.len(), 4);
        let matching: Vec<Employee> = store.all().into_iter().filter(|e| e.id == 1).collect();
        assert_eq!(matching.len(), 2);
        // Lookup still returns the first match.
        assert_eq!(store.get(1).map(|e| e.name), Some("John Mackenzie".to_string()));
    }

    #[test]
    fn update_misses_leave_the_collection_unchanged() {
        let store = EmployeeStore::seeded();
        let before = store.all();
        let ghost = Employee::new(99, "Nobody", "Ghost", 1.0);
        assert!(!store.update(&ghost));
        assert_eq!(store.all(), before);
    }

    #[test]
    fn update_overwrites_fields_in_place() {
        let store = EmployeeStore::seeded();
        let replacement = Employee::new(1, "Johnny", "Lead", 70_000.0);
        assert!(store.update(&replacement));
        assert_eq!(store.get(1), Some(replacement));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn delete_removes_exactly_one_record() {
        let store = EmployeeStore::seeded();
        assert!(store.delete(2));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2), None);
        assert!(!store.delete(2));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn amend_profile_writes_back_and_returns_the_record() {
        let store = EmployeeStore::seeded();
        let updated = store.amend_profile(3, "Renamed", "Architect");
        assert_eq!(
            updated,
            Some(Employee::new(3, "Renamed", "Architect", 50_000.0))
        );
        assert_eq!(store.get(3).map(|e| e.name), Some("Renamed".to_string()));
        assert_eq!(store.amend_profile(42, "x", "y"), None);
    }
}
