//! Handlers for the rule table and stand-alone temperature checks.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rules` | The acceptance rule table, keyed by normalised category |
//! | `POST` | `/evaluate` | Body: [`EvaluateBody`]; 400 if the temperature is unparseable |

use axum::{Json, extract::State};
use corner_core::{
  reception::Evaluator,
  rules::{AcceptanceRule, RuleTable},
  store::CornerStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

/// `GET /rules`
pub async fn rules<S>(State(state): State<ApiState<S>>) -> Json<RuleTable>
where
  S: CornerStore,
{
  Json(RuleTable::clone(&state.rules))
}

#[derive(Debug, Deserialize)]
pub struct EvaluateBody {
  /// Operator text, e.g. `"3,8"`.
  pub temperature: String,
  /// Category to apply. When absent, `product` is resolved via the catalog.
  pub category:    Option<String>,
  pub product:     Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
  /// `"accepted"`, `"rejected"`, or `""` when no rule applies.
  pub verdict:  &'static str,
  pub category: Option<String>,
  pub rule:     Option<AcceptanceRule>,
}

/// `POST /evaluate`
pub async fn evaluate<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<EvaluateBody>,
) -> Result<Json<EvaluateResponse>, ApiError>
where
  S: CornerStore,
{
  let category = match (body.category, body.product) {
    (Some(category), _) => Some(category),
    (None, Some(product)) => state
      .catalog
      .resolver(&*state.store)
      .await
      .map_err(ApiError::store)?
      .resolve(&product)
      .map(str::to_owned),
    (None, None) => None,
  };

  let evaluator = Evaluator::new(&state.rules);
  let verdict = evaluator.check(&body.temperature, category.as_deref())?;
  let rule = evaluator.rule_for(category.as_deref()).copied();

  Ok(Json(EvaluateResponse { verdict: verdict.as_str(), category, rule }))
}
