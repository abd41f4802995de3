use super::print_json;
use anyhow::{Context, Result, bail};
use planner_application::AppContext;
use planner_core::models::{
    Assignment, Course, ListBody, Schedule, StudySession, grade_point_average,
};
use planner_interaction::{QueryParams, QueryValue, UploadFile};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::path::Path;

/// Uploads above this size are refused before any request is made.
const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

fn parse_body(data: Option<&str>) -> Result<Option<Value>> {
    data.map(|raw| serde_json::from_str(raw).context("--data must be valid JSON"))
        .transpose()
}

pub async fn get(context: &AppContext, path: &str, query: Vec<(String, String)>) -> Result<()> {
    let params: QueryParams = query
        .into_iter()
        .map(|(key, value)| (key, QueryValue::Text(value)))
        .collect();
    let params = (!params.is_empty()).then_some(params);

    let response: Value = context.http()?.get(path, params.as_ref()).await?;
    print_json(&response)
}

pub async fn post(context: &AppContext, path: &str, data: Option<&str>) -> Result<()> {
    let body = parse_body(data)?;
    let response: Value = context.http()?.post(path, body.as_ref()).await?;
    print_json(&response)
}

pub async fn put(context: &AppContext, path: &str, data: Option<&str>) -> Result<()> {
    let body = parse_body(data)?;
    let response: Value = context.http()?.put(path, body.as_ref()).await?;
    print_json(&response)
}

pub async fn patch(context: &AppContext, path: &str, data: Option<&str>) -> Result<()> {
    let body = parse_body(data)?;
    let response: Value = context.http()?.patch(path, body.as_ref()).await?;
    print_json(&response)
}

pub async fn delete(context: &AppContext, path: &str) -> Result<()> {
    let response: Value = context.http()?.delete(path).await?;
    print_json(&response)
}

pub async fn upload(
    context: &AppContext,
    path: &str,
    file: &Path,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let upload = UploadFile::from_path(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if upload.bytes.len() > MAX_UPLOAD_BYTES {
        bail!(
            "{} is {} bytes; uploads are limited to {} bytes",
            file.display(),
            upload.bytes.len(),
            MAX_UPLOAD_BYTES
        );
    }

    let extra: Map<String, Value> = fields
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let extra = (!extra.is_empty()).then_some(extra);

    let response: Value = context
        .http()?
        .upload(path, upload, extra.as_ref())
        .await?;
    print_json(&response)
}

/// Fetches a list endpoint, whatever envelope it answers with.
async fn list<T: DeserializeOwned>(context: &AppContext, path: &str) -> Result<Vec<T>> {
    let body: ListBody<T> = context.http()?.get(path, None).await?;
    Ok(body.into_items())
}

pub async fn courses(context: &AppContext) -> Result<()> {
    print_json(&list::<Course>(context, "courses").await?)
}

pub async fn assignments(context: &AppContext) -> Result<()> {
    print_json(&list::<Assignment>(context, "assignments").await?)
}

pub async fn schedule(context: &AppContext) -> Result<()> {
    print_json(&list::<Schedule>(context, "schedule").await?)
}

pub async fn sessions(context: &AppContext) -> Result<()> {
    print_json(&list::<StudySession>(context, "study-sessions").await?)
}

pub async fn gpa(context: &AppContext) -> Result<()> {
    let courses = list::<Course>(context, "courses").await?;
    print_json(&gpa_report(&courses))
}

fn gpa_report(courses: &[Course]) -> Value {
    let graded: Vec<&Course> = courses.iter().filter(|c| c.grade.is_some()).collect();
    json!({
        "gpa": grade_point_average(courses),
        "gradedCourses": graded.len(),
        "gradedCredits": graded.iter().map(|c| c.credits).sum::<u32>(),
    })
}
