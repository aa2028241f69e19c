use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title given to a freshly created workout
pub const DEFAULT_WORKOUT_NAME: &str = "Strength Workout";

/// One exercise prescription inside a workout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutStep {
  pub exercise_id: i64,
  pub exercise_name: String,
  pub reps: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub weight_lbs: Option<i64>,
  /// 1-based position, reassigned on every save
  #[serde(default)]
  pub order_index: i64,
}

impl WorkoutStep {
  /// The step every new workout starts with
  pub fn default_step() -> Self {
    Self {
      exercise_id: 3,
      exercise_name: "Squat".to_string(),
      reps: 10,
      weight_lbs: None,
      order_index: 1,
    }
  }

  /// A step still pointing at the "pick an exercise" placeholder
  pub fn has_placeholder_exercise(&self) -> bool {
    self.exercise_id <= 0 || self.exercise_name.trim().is_empty()
  }
}

/// A persisted workout row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
  pub id: i64,
  pub workout_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  pub steps: Vec<WorkoutStep>,
  pub created_at: DateTime<Utc>,
}

/// For creating or replacing workouts (no id, created_at)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDraft {
  pub workout_name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default)]
  pub steps: Vec<WorkoutStep>,
}

impl Default for WorkoutDraft {
  fn default() -> Self {
    Self::new()
  }
}

impl WorkoutDraft {
  /// New workout as the builder screen opens it: default title, one squat step
  pub fn new() -> Self {
    Self {
      workout_name: DEFAULT_WORKOUT_NAME.to_string(),
      notes: None,
      steps: vec![WorkoutStep::default_step()],
    }
  }

  /// Shared completeness rule for every save action.
  ///
  /// A workout needs a non-blank name, at least one step, and every step must
  /// reference a real exercise.
  pub fn validate(&self) -> Result<(), String> {
    if self.workout_name.trim().is_empty() {
      return Err("Please enter a workout title".to_string());
    }
    if self.steps.is_empty() {
      return Err("A workout needs at least one step".to_string());
    }
    if let Some(pos) = self.steps.iter().position(|s| s.has_placeholder_exercise()) {
      return Err(format!("Step {} has no exercise selected", pos + 1));
    }
    Ok(())
  }

  pub fn is_complete(&self) -> bool {
    self.validate().is_ok()
  }
}

impl From<&Workout> for WorkoutDraft {
  fn from(workout: &Workout) -> Self {
    Self {
      workout_name: workout.workout_name.clone(),
      notes: workout.notes.clone(),
      steps: workout.steps.clone(),
    }
  }
}

/// Exercise lookup row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Exercise {
  pub id: i64,
  pub name: String,
}
