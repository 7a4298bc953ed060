//! Book endpoints, including PDF upload and download

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::{Multipart, WithRejection};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, PlainTextError},
    models::book::{Book, BookInput},
    AppState,
};

const BOOK_NOT_FOUND: &str = "Book not found.";
const UPLOAD_FAILED: &str = "File upload failed!";

/// Multipart form accepted by the upload endpoint
#[derive(ToSchema)]
pub struct UploadPdfForm {
    /// The PDF file; its original name becomes the stored name
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookInput,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "A referenced author does not exist", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    WithRejection(Json(data), _): WithRejection<Json<BookInput>, AppError>,
) -> AppResult<(StatusCode, Json<Book>)> {
    tracing::info!("POST /books: {}", data.title);
    data.validate()?;

    let book = state.services.books.create(&data).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.books.list().await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookInput,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or referenced author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
    WithRejection(Json(data), _): WithRejection<Json<BookInput>, AppError>,
) -> AppResult<Json<Book>> {
    tracing::info!("PUT /books/{}", id);
    data.validate()?;

    let book = state.services.books.update(id, &data).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted (or never existed)")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, AppError>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Log a failed upload and turn it into a plain-text answer
fn upload_failed(error: AppError) -> PlainTextError {
    match error {
        AppError::NotFound(_) => PlainTextError::new(error, BOOK_NOT_FOUND),
        AppError::BadRequest(_) | AppError::PayloadTooLarge(_) => {
            tracing::warn!("Rejected upload: {}", error);
            PlainTextError::from(error)
        }
        _ => {
            tracing::error!("File upload failed: {}", error);
            PlainTextError::new(error, UPLOAD_FAILED)
        }
    }
}

/// Pull the `file` part out of the form: its original name and its bytes
async fn read_file_part(multipart: &mut Multipart) -> AppResult<(String, Vec<u8>)> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The file part has no file name".to_string()))?;
        let bytes = field.bytes().await?;
        return Ok((filename, bytes.to_vec()));
    }
    Err(AppError::BadRequest("Missing 'file' part".to_string()))
}

/// Upload a PDF and attach it to a book
#[utoipa::path(
    post,
    path = "/books/{id}/upload-pdf",
    tag = "books",
    params(("id" = i64, Path, description = "Book ID")),
    request_body(content = UploadPdfForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File stored and attached", body = String, content_type = "text/plain"),
        (status = 400, description = "Malformed form or file name", body = String, content_type = "text/plain"),
        (status = 404, description = "Book not found", body = String, content_type = "text/plain"),
        (status = 413, description = "File larger than the upload limit", body = String, content_type = "text/plain"),
        (status = 500, description = "A file with this name already exists, or storage failed", body = String, content_type = "text/plain")
    )
)]
pub async fn upload_pdf(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<String, PlainTextError> {
    state
        .services
        .books
        .get_by_id(id)
        .await
        .map_err(upload_failed)?;

    let (filename, bytes) = read_file_part(&mut multipart)
        .await
        .map_err(upload_failed)?;
    tracing::info!("Upload for book {}: {} ({} bytes)", id, filename, bytes.len());

    let path = state
        .services
        .files
        .store_new(&filename, &bytes)
        .await
        .map_err(upload_failed)?;

    if let Err(e) = state.services.books.attach_file(id, path).await {
        // Free the name again; the book keeps its previous pdf_path
        if let Err(cleanup) = state.services.files.remove(&filename).await {
            tracing::warn!("Could not remove orphaned upload {}: {}", filename, cleanup);
        }
        return Err(upload_failed(e));
    }

    Ok(format!("File uploaded successfully: {}", filename))
}

/// Download a stored PDF as an attachment
#[utoipa::path(
    get,
    path = "/books/files/{filename}",
    tag = "books",
    params(("filename" = String, Path, description = "Stored file name")),
    responses(
        (status = 200, description = "The PDF file", body = [u8], content_type = "application/pdf"),
        (status = 400, description = "Invalid file name", body = String, content_type = "text/plain"),
        (status = 404, description = "No such file", body = String, content_type = "text/plain"),
        (status = 500, description = "The file could not be read", body = String, content_type = "text/plain")
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, PlainTextError> {
    let bytes = state
        .services
        .files
        .read(&filename)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => {
                tracing::warn!("File not found: {}", filename);
                PlainTextError::new(e, "File not found.")
            }
            AppError::BadRequest(_) => PlainTextError::from(e),
            _ => {
                tracing::error!("Could not read {}: {}", filename, e);
                PlainTextError::new(e, "Could not read the file!")
            }
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
