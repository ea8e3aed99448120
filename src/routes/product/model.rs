use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::media::UploadResult;

// 商品落库形态，序列化字段名即对外 JSON 字段名
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub name: String,
    pub price: f64,
    pub stock: f64,
    pub discount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub section: String,
    pub image_url: String,
    // 媒体对象的引用ID，删除商品时据此删除图片
    pub media_id: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub protection: String,
    #[serde(default)]
    pub customization: String,
    #[serde(default)]
    pub item_num: String,
    #[serde(default)]
    pub price_type: String,
}

// 查询响应：文档附带存储分配的ID
#[derive(Debug, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(flatten)]
    pub product: Product,
}

// 创建商品的 multipart 文本字段；数值以字符串进场，校验时再转数值
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub material: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub warranty: String,
    #[serde(default)]
    pub protection: String,
    #[serde(default)]
    pub customization: String,
    #[serde(default)]
    pub item_num: String,
    #[serde(default)]
    pub price_type: String,
}

impl ProductForm {
    // 入参校验：全部通过后才允许任何副作用发生
    pub fn validate(self) -> Result<ValidatedProduct, AppError> {
        let price: f64 = self
            .price
            .trim()
            .parse()
            .map_err(|_| AppError::validation("Price must be a number"))?;
        let stock: f64 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| AppError::validation("Stock must be a number"))?;
        let discount: f64 = self
            .discount
            .trim()
            .parse()
            .map_err(|_| AppError::validation("Discount must be a number"))?;
        // 只拦整串都是数字的名字，夹带字母的放行
        if self.name.trim().parse::<f64>().is_ok() {
            return Err(AppError::validation(
                "Name must contain letters, not just numbers",
            ));
        }
        if self.section.trim().is_empty() {
            return Err(AppError::validation("Section is required"));
        }

        Ok(ValidatedProduct {
            form: self,
            price,
            stock,
            discount,
        })
    }
}

// 校验通过的表单：数值字段已经完成无损转换
#[derive(Debug)]
pub struct ValidatedProduct {
    form: ProductForm,
    price: f64,
    stock: f64,
    discount: f64,
}

impl ValidatedProduct {
    pub fn into_product(self, image: &UploadResult) -> Product {
        Product {
            name: self.form.name,
            price: self.price,
            stock: self.stock,
            discount: self.discount,
            description: self.form.description,
            category: self.form.category,
            section: self.form.section,
            image_url: image.secure_url.clone(),
            media_id: Some(image.public_id.clone()),
            created_at: chrono::Utc::now().to_rfc3339(),
            material: self.form.material,
            detail: self.form.detail,
            design: self.form.design,
            condition: self.form.condition,
            warranty: self.form.warranty,
            protection: self.form.protection,
            customization: self.form.customization,
            item_num: self.form.item_num,
            price_type: self.form.price_type,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub message: String,
    pub id: String,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteProductResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload() -> UploadResult {
        UploadResult {
            secure_url: "https://media.example/product-images/abc.jpg".to_string(),
            public_id: "product-images/abc".to_string(),
        }
    }

    fn valid_form() -> ProductForm {
        ProductForm {
            name: "Walnut desk".to_string(),
            price: "12.5".to_string(),
            stock: "3".to_string(),
            discount: "0".to_string(),
            section: "furniture".to_string(),
            ..ProductForm::default()
        }
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(message) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn numeric_strings_coerce_losslessly() {
        let product = valid_form().validate().unwrap().into_product(&upload());
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(value["price"], serde_json::json!(12.5));
        assert_eq!(value["stock"], serde_json::json!(3.0));
        assert_eq!(value["discount"], serde_json::json!(0.0));
        assert!(value["price"].is_number());
    }

    #[test]
    fn non_numeric_price_is_rejected() {
        let mut form = valid_form();
        form.price = "abc".to_string();
        let message = validation_message(form.validate().unwrap_err());
        assert_eq!(message, "Price must be a number");
    }

    #[test]
    fn non_numeric_stock_and_discount_are_rejected() {
        let mut form = valid_form();
        form.stock = "many".to_string();
        assert_eq!(
            validation_message(form.validate().unwrap_err()),
            "Stock must be a number"
        );

        let mut form = valid_form();
        form.discount = "half".to_string();
        assert_eq!(
            validation_message(form.validate().unwrap_err()),
            "Discount must be a number"
        );
    }

    #[test]
    fn purely_numeric_name_is_rejected() {
        let mut form = valid_form();
        form.name = "12345".to_string();
        assert_eq!(
            validation_message(form.validate().unwrap_err()),
            "Name must contain letters, not just numbers"
        );
    }

    #[test]
    fn name_with_letters_and_digits_passes() {
        // 启发式只拦整串数字，4K Monitor 这类名字要放行
        let mut form = valid_form();
        form.name = "4K Monitor".to_string();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn empty_section_is_rejected() {
        let mut form = valid_form();
        form.section = "  ".to_string();
        assert_eq!(
            validation_message(form.validate().unwrap_err()),
            "Section is required"
        );
    }

    #[test]
    fn negative_numbers_are_coerced_not_rejected() {
        let mut form = valid_form();
        form.price = "-5".to_string();
        let product = form.validate().unwrap().into_product(&upload());
        assert_eq!(product.price, -5.0);
    }

    #[test]
    fn product_document_carries_image_and_timestamp() {
        let product = valid_form().validate().unwrap().into_product(&upload());
        assert_eq!(product.image_url, "https://media.example/product-images/abc.jpg");
        assert_eq!(product.media_id.as_deref(), Some("product-images/abc"));
        assert!(!product.created_at.is_empty());
    }

    #[test]
    fn record_flattens_document_next_to_id() {
        let product = valid_form().validate().unwrap().into_product(&upload());
        let record = ProductRecord {
            id: "doc-1".to_string(),
            product,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], "doc-1");
        assert_eq!(value["name"], "Walnut desk");
        assert_eq!(value["section"], "furniture");
    }
}
