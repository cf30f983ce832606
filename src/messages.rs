//! User-facing message strings, centralized so views and commands agree.

use crate::cache::MutationMessages;

pub const LOGIN_SUCCESS: &str = "Login successful! Welcome back.";
pub const LOGIN_ERROR: &str = "Invalid email or password";
pub const LOGOUT_SUCCESS: &str = "Logged out successfully";
pub const SIGNUP_SUCCESS: &str = "Account created successfully!";
pub const SIGNUP_ERROR: &str = "Failed to create account";
pub const TOKEN_EXPIRED: &str = "Your session has expired. Please log in again.";

pub const LEAD_CREATE: MutationMessages = MutationMessages {
  success: "Lead created successfully!",
  failure: "Failed to create lead",
};
pub const LEAD_UPDATE: MutationMessages = MutationMessages {
  success: "Lead updated successfully!",
  failure: "Failed to update lead",
};
pub const LEAD_DELETE: MutationMessages = MutationMessages {
  success: "Lead deleted successfully!",
  failure: "Failed to delete lead",
};
pub const LEAD_CONVERT: MutationMessages = MutationMessages {
  success: "Lead converted to customer successfully!",
  failure: "Failed to convert lead",
};

pub const CUSTOMER_CREATE: MutationMessages = MutationMessages {
  success: "Customer created successfully!",
  failure: "Failed to create customer",
};

pub const USER_CREATE: MutationMessages = MutationMessages {
  success: "User created successfully!",
  failure: "Failed to create user",
};
pub const USER_UPDATE: MutationMessages = MutationMessages {
  success: "User updated successfully!",
  failure: "Failed to update user",
};
pub const USER_DELETE: MutationMessages = MutationMessages {
  success: "User deleted successfully!",
  failure: "Failed to delete user",
};

pub const WORK_ITEM_CREATE: MutationMessages = MutationMessages {
  success: "Work item created successfully!",
  failure: "Failed to create work item",
};
pub const WORK_ITEM_UPDATE: MutationMessages = MutationMessages {
  success: "Work item updated successfully!",
  failure: "Failed to update work item",
};
pub const WORK_ITEM_DELETE: MutationMessages = MutationMessages {
  success: "Work item deleted successfully!",
  failure: "Failed to delete work item",
};

pub const TASK_CREATE: MutationMessages = MutationMessages {
  success: "Task created successfully!",
  failure: "Failed to create task",
};
pub const TASK_UPDATE: MutationMessages = MutationMessages {
  success: "Task updated successfully!",
  failure: "Failed to update task",
};
pub const TASK_DELETE: MutationMessages = MutationMessages {
  success: "Task deleted successfully!",
  failure: "Failed to delete task",
};

pub const COMM_CREATE: MutationMessages = MutationMessages {
  success: "Communication logged successfully!",
  failure: "Failed to log communication",
};
pub const COMM_UPDATE: MutationMessages = MutationMessages {
  success: "Communication updated successfully!",
  failure: "Failed to update communication",
};
pub const COMM_DELETE: MutationMessages = MutationMessages {
  success: "Communication deleted successfully!",
  failure: "Failed to delete communication",
};
