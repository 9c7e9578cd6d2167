//! Action trait - 型付きアクションの定義
//!
//! リクエストの `action` 名と params の型を対応付けます。
//! params は serde でデコードされ、結果は `Output` としてエンコードされます。

use serde::Serialize;
use serde::de::DeserializeOwned;

/// # 使用例
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct GetStockPrice {
///     ticker: String,
/// }
///
/// impl Action for GetStockPrice {
///     const NAME: &'static str = "get_stock_price";
///     type Output = StockPrice;
/// }
/// ```
///
/// # Trait Bounds
/// - `DeserializeOwned`: リクエストの params から復元するため
/// - `Serialize`: 呼び出し側がリクエストを組み立てるため
/// - `'static`: Arc に格納できるため
pub trait Action: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Wire name carried in the request's `action` field.
    const NAME: &'static str;

    type Output: Serialize + Send;
}
