use axum::{
    Json,
    extract::{Multipart, Path, State},
    response::IntoResponse,
};
use serde_json::Value;
use tracing::{error, warn};

use crate::{
    AppState,
    error::AppError,
    store::{Document, PRODUCTS_COLLECTION},
};

use super::model::{
    CreateProductResponse, DeleteProductResponse, Product, ProductForm, ProductRecord,
};

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut image: Option<(String, Vec<u8>)> = None;
    let mut fields = serde_json::Map::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::validation(format!("Invalid multipart payload: {}", err)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "image" {
            let filename = field.file_name().unwrap_or("upload").to_string();
            let bytes = field.bytes().await.map_err(|err| {
                AppError::validation(format!("Invalid multipart payload: {}", err))
            })?;
            image = Some((filename, bytes.to_vec()));
        } else {
            let value = field.text().await.map_err(|err| {
                AppError::validation(format!("Invalid multipart payload: {}", err))
            })?;
            fields.insert(name, Value::String(value));
        }
    }

    // 校验全部先于副作用：这里失败不会留下半个上传
    let (filename, bytes) = image.ok_or_else(|| AppError::validation("Image file is required"))?;
    let form: ProductForm = serde_json::from_value(Value::Object(fields))
        .map_err(|err| AppError::validation(format!("Invalid form field: {}", err)))?;
    let validated = form.validate()?;

    let uploaded = state.media.upload(bytes, &filename).await.map_err(|err| {
        error!("Image upload failed: {}", err);
        AppError::upstream("Failed to create product", err)
    })?;

    let product = validated.into_product(&uploaded);
    let document = serde_json::to_value(&product)
        .map_err(|err| AppError::upstream("Failed to create product", err))?;

    let id = state
        .store
        .add(PRODUCTS_COLLECTION, &document)
        .await
        .map_err(|err| {
            // 插入失败时上传已经完成，媒体对象成为孤儿，只能记录
            error!(
                "Product insert failed, orphaned media object {}: {}",
                uploaded.public_id, err
            );
            AppError::upstream("Failed to create product", err)
        })?;

    Ok(Json(CreateProductResponse {
        message: "Product created successfully".to_string(),
        id,
        image_url: uploaded.secure_url,
    }))
}

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductRecord>>, AppError> {
    let documents = state
        .store
        .list(PRODUCTS_COLLECTION)
        .await
        .map_err(|err| AppError::upstream("Failed to fetch documents", err))?;
    Ok(Json(into_records(documents, "Failed to fetch documents")?))
}

#[axum::debug_handler]
pub async fn list_by_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Json<Vec<ProductRecord>>, AppError> {
    let documents = state
        .store
        .find_by_field(PRODUCTS_COLLECTION, "section", &section)
        .await
        .map_err(|err| AppError::upstream("Failed to fetch products by section", err))?;
    Ok(Json(into_records(
        documents,
        "Failed to fetch products by section",
    )?))
}

#[axum::debug_handler]
pub async fn get_product(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<ProductRecord>, AppError> {
    let data = state
        .store
        .get(PRODUCTS_COLLECTION, &post_id)
        .await
        .map_err(|err| AppError::upstream("Failed to fetch product", err))?
        .ok_or_else(|| AppError::not_found("Product not found"))?;

    let product: Product = serde_json::from_value(data)
        .map_err(|err| AppError::upstream("Failed to fetch product", err))?;

    Ok(Json(ProductRecord {
        id: post_id,
        product,
    }))
}

#[axum::debug_handler]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteProductResponse>, AppError> {
    let data = state
        .store
        .get(PRODUCTS_COLLECTION, &id)
        .await
        .map_err(|err| AppError::upstream("Failed to delete document", err))?
        .ok_or_else(|| AppError::not_found("Document not found"))?;

    let product: Product = serde_json::from_value(data)
        .map_err(|err| AppError::upstream("Failed to delete document", err))?;

    // 先尽力删媒体对象再删文档；媒体删除失败只记日志不阻断，
    // 两步之间没有事务，中途失败会留下指向已删图片的文档
    if let Some(media_id) = &product.media_id {
        if let Err(err) = state.media.destroy(media_id).await {
            warn!("Media delete failed for {}: {}", media_id, err);
        }
    }

    state
        .store
        .delete(PRODUCTS_COLLECTION, &id)
        .await
        .map_err(|err| AppError::upstream("Failed to delete document", err))?;

    Ok(Json(DeleteProductResponse {
        message: "Document deleted".to_string(),
    }))
}

// 把存储返回的文档批量转成带ID的响应记录
fn into_records(documents: Vec<Document>, context: &str) -> Result<Vec<ProductRecord>, AppError> {
    documents
        .into_iter()
        .map(|document| {
            let product: Product = serde_json::from_value(document.data)
                .map_err(|err| AppError::upstream(context, err))?;
            Ok(ProductRecord {
                id: document.id,
                product,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product_value(name: &str, section: &str) -> serde_json::Value {
        json!({
            "name": name,
            "price": 12.5,
            "stock": 3.0,
            "discount": 0.0,
            "description": "",
            "category": "",
            "section": section,
            "imageUrl": "https://media.example/x.jpg",
            "mediaId": "product-images/x",
            "createdAt": "2026-08-06T00:00:00+00:00",
        })
    }

    #[test]
    fn documents_become_records_with_ids() {
        let documents = vec![
            Document {
                id: "a".to_string(),
                data: product_value("Desk", "furniture"),
            },
            Document {
                id: "b".to_string(),
                data: product_value("Lamp", "lighting"),
            },
        ];

        let records = into_records(documents, "Failed to fetch documents").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].product.name, "Desk");
        assert_eq!(records[1].product.section, "lighting");
    }

    #[test]
    fn malformed_document_surfaces_as_upstream_error() {
        let documents = vec![Document {
            id: "broken".to_string(),
            data: json!({ "name": "no numbers here" }),
        }];

        let err = into_records(documents, "Failed to fetch documents").unwrap_err();
        match err {
            AppError::Upstream { context, .. } => {
                assert_eq!(context, "Failed to fetch documents");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }
}
