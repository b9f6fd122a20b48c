// ABOUTME: Compile-fail test verifying ServiceId and TaskId are not interchangeable.
// ABOUTME: This test should fail to compile, validating type safety.

use rollcall::types::{ServiceId, TaskId};

fn takes_service_id(_id: ServiceId) {}

fn main() {
    let task_id = TaskId::new("task123");
    takes_service_id(task_id); // ERROR: expected ServiceId, found TaskId
}
