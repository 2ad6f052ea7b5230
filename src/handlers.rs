use crate::errors::AppError;
use crate::models::{
    Configuration, LastPaymentRequest, PaymentRecord, PaymentRequest, ScheduleResponse,
};
use crate::schedule::build_schedule;
use crate::state::AppState;
use crate::storage::{persist_data, StoredData};
use crate::tracker;
use crate::ui::{render_setup, render_tracker};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Redirect},
    Form, Json,
};
use chrono::Local;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    let page = match tracker::configuration(&*data) {
        Some(configuration) => render_tracker(&configuration, &schedule_for(&data)),
        None => render_setup(&Configuration::default()),
    };
    Html(page)
}

pub async fn setup(State(state): State<AppState>) -> Html<String> {
    let data = state.data.lock().await;
    let configuration = tracker::configuration(&*data).unwrap_or_default();
    Html(render_setup(&configuration))
}

pub async fn get_configuration(
    State(state): State<AppState>,
) -> Result<Json<Configuration>, AppError> {
    let data = state.data.lock().await;
    tracker::configuration(&*data)
        .map(Json)
        .ok_or_else(|| AppError::not_found("no configuration saved"))
}

pub async fn put_configuration(
    State(state): State<AppState>,
    Json(payload): Json<Configuration>,
) -> Result<Json<Configuration>, AppError> {
    let saved = commit(&state, |data| tracker::save_configuration(data, payload)).await?;
    Ok(Json(saved))
}

pub async fn delete_configuration(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    apply_reset(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_reset(&state).await?;
    Ok(Redirect::to("/"))
}

async fn apply_reset(state: &AppState) -> Result<(), AppError> {
    commit(state, |data| {
        tracker::reset(data);
        Ok(())
    })
    .await
}

pub async fn get_schedule(State(state): State<AppState>) -> Json<ScheduleResponse> {
    let data = state.data.lock().await;
    Json(schedule_for(&data))
}

pub async fn post_payment(
    State(state): State<AppState>,
    Json(payload): Json<PaymentRequest>,
) -> Result<Json<PaymentRecord>, AppError> {
    let record = apply_payment(&state, payload).await?;
    Ok(Json(record))
}

pub async fn pay_form(
    State(state): State<AppState>,
    Form(payload): Form<PaymentRequest>,
) -> Result<Redirect, AppError> {
    apply_payment(&state, payload).await?;
    Ok(Redirect::to("/"))
}

async fn apply_payment(state: &AppState, payload: PaymentRequest) -> Result<PaymentRecord, AppError> {
    let today = Local::now().date_naive();
    commit(state, |data| tracker::record_payment(data, payload, today)).await
}

pub async fn put_last_payment(
    State(state): State<AppState>,
    Json(payload): Json<LastPaymentRequest>,
) -> Result<Json<ScheduleResponse>, AppError> {
    let schedule = apply_last_payment(&state, &payload.date).await?;
    Ok(Json(schedule))
}

pub async fn last_payment_form(
    State(state): State<AppState>,
    Form(payload): Form<LastPaymentRequest>,
) -> Result<Redirect, AppError> {
    apply_last_payment(&state, &payload.date).await?;
    Ok(Redirect::to("/"))
}

async fn apply_last_payment(state: &AppState, date: &str) -> Result<ScheduleResponse, AppError> {
    commit(state, |data| {
        tracker::set_day_of_last_payment(data, date)?;
        Ok(schedule_for(data))
    })
    .await
}

pub async fn just_paid(State(state): State<AppState>) -> Result<Json<ScheduleResponse>, AppError> {
    let schedule = apply_just_paid(&state).await?;
    Ok(Json(schedule))
}

pub async fn just_paid_form(State(state): State<AppState>) -> Result<Redirect, AppError> {
    apply_just_paid(&state).await?;
    Ok(Redirect::to("/"))
}

async fn apply_just_paid(state: &AppState) -> Result<ScheduleResponse, AppError> {
    commit(state, |data| {
        tracker::mark_just_paid(data, Local::now());
        Ok(schedule_for(data))
    })
    .await
}

/// Applies `change` to a copy of the state and only keeps it once the copy is
/// on disk.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut StoredData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut next = data.clone();
    let output = change(&mut next)?;
    persist_data(&state.data_path, &next).await?;
    *data = next;
    Ok(output)
}

fn schedule_for(data: &StoredData) -> ScheduleResponse {
    let configuration = tracker::configuration(data);
    let records = tracker::records(data);
    build_schedule(
        configuration.as_ref(),
        tracker::day_of_last_payment(data),
        &records,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentKind;
    use crate::storage::KeyValueStore;

    fn unwritable_state() -> AppState {
        // A directory cannot be written as a file.
        AppState::new(std::env::temp_dir(), StoredData::default())
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let state = unwritable_state();

        let err = apply_just_paid(&state).await.unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let configuration = Configuration {
            total_price: "300".to_string(),
            ..Configuration::default()
        };
        let err = commit(&state, |data| tracker::save_configuration(data, configuration))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let data = state.data.lock().await;
        assert_eq!(*data, StoredData::default());
        assert!(tracker::day_of_last_payment(&*data).is_none());
    }

    #[tokio::test]
    async fn rejected_change_is_not_written() {
        let state = unwritable_state();
        let request = PaymentRequest {
            day: "02.03".to_string(),
            kind: Some(PaymentKind::Skipped),
            value: None,
            moved_to: None,
        };

        // Validation fails before any write is attempted.
        let err = apply_payment(&state, request).await.unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(state.data.lock().await.get(crate::storage::PAYED_DAYS_KEY).is_none());
    }
}
