//! System prompt for the shopping assistant.
//!
//! The live prompt is rendered from a fresh catalog snapshot and teaches the
//! model the action tag grammar. When the snapshot cannot be read the fixed
//! fallback prompt is used instead, and it never mentions actions: entry ids
//! that could not be verified must not be offered to the model.

use std::sync::Arc;

use dappazon_core::domain::catalog::{CatalogEntry, CatalogSnapshot};
use dappazon_ledger::{read_snapshot, CatalogSource};

const INTRO: &str = "Bạn là trợ lý AI thông minh cho Dappazon - một nền tảng thương mại điện tử phi tập trung (decentralized e-commerce) chạy trên blockchain Ethereum.

**Thông tin về Dappazon:**
- Dappazon là marketplace blockchain nơi người dùng mua sản phẩm bằng Ethereum (ETH)
- Tất cả giao dịch được ghi lại trên blockchain, đảm bảo minh bạch và bảo mật
- Người dùng cần ví MetaMask để kết nối và mua hàng
- Smart contract quản lý toàn bộ sản phẩm và đơn hàng";

const PURCHASE_GUIDE: &str = "**Hướng dẫn mua hàng:**
1. Cài đặt MetaMask extension từ metamask.io
2. Tạo hoặc import ví Ethereum
3. Kết nối ví với Dappazon (nút \"Connect\")
4. Chọn sản phẩm muốn mua
5. Click \"Buy Now\" và xác nhận giao dịch trong MetaMask
6. Chờ blockchain xác nhận (vài giây)";

const LIVE_ROLE: &str = "**Vai trò của bạn:**
- Trả lời câu hỏi về sản phẩm, giá cả, tồn kho (SỬ DỤNG DỮ LIỆU THỜI GIAN THỰC Ở TRÊN)
- Giải thích về blockchain, Ethereum, smart contracts
- Hướng dẫn cài đặt và sử dụng MetaMask
- Giúp người dùng hiểu cách mua hàng trên Dappazon
- Hỗ trợ cả tiếng Việt và tiếng Anh
- Giữ câu trả lời ngắn gọn, thân thiện, dễ hiểu";

const ACTION_EXAMPLES: &str = "Ví dụ responses:
- User: \"Cho xem Drone\" → \"Đây là Drone - flycam chất lượng cao với giá 2 ETH! [ACTION:VIEW_PRODUCT:2]\"
- User: \"Mua Camera\" → \"Camera có giá 1 ETH, đánh giá 4 sao. Bấm nút bên dưới để xem chi tiết! [ACTION:VIEW_PRODUCT:1]\"
- User: \"Sản phẩm điện tử\" → \"Chúng tôi có Camera, Drone, Headset... [ACTION:VIEW_CATEGORY:electronics]\"
- User: \"Về trang chủ\" → \"Đưa bạn về trang chủ ngay! [ACTION:GO_HOME]\"
- User: \"Xem giỏ hàng\" → \"Đây là giỏ hàng của bạn! [ACTION:GO_CART]\"
- User: \"Giá ETH hôm nay\" → \"Để tôi tìm kiếm giá ETH mới nhất cho bạn... [ACTION:WEB_SEARCH:giá ethereum hôm nay]\"
- User: \"Tin tức crypto mới\" → \"Tôi sẽ tìm tin tức crypto mới nhất! [ACTION:WEB_SEARCH:tin tức cryptocurrency mới nhất]\"";

const WEB_SEARCH_RULES: &str = "QUAN TRỌNG VỀ WEB SEARCH:
- Chỉ dùng WEB_SEARCH khi user hỏi thông tin NGOÀI Dappazon
- Các câu hỏi về sản phẩm Dappazon → trả lời từ dữ liệu blockchain ở trên
- Các câu hỏi về giá crypto, tin tức, thông tin bên ngoài → dùng WEB_SEARCH";

const LIVE_CLOSING: &str = "Hãy trả lời một cách tự nhiên, hữu ích và chuyên nghiệp! Luôn thêm action khi phù hợp để giúp user dễ dàng tương tác.";

/// Used verbatim whenever the catalog snapshot is unavailable.
pub const FALLBACK_PROMPT: &str = "Bạn là trợ lý AI thông minh cho Dappazon - một nền tảng thương mại điện tử phi tập trung (decentralized e-commerce) chạy trên blockchain Ethereum.

**Thông tin về Dappazon:**
- Dappazon là marketplace blockchain nơi người dùng mua sản phẩm bằng Ethereum (ETH)
- Tất cả giao dịch được ghi lại trên blockchain, đảm bảo minh bạch và bảo mật
- Người dùng cần ví MetaMask để kết nối và mua hàng
- Smart contract quản lý toàn bộ sản phẩm và đơn hàng

**Danh mục sản phẩm:**

📱 Electronics & Gadgets:
- Camera (1 ETH) - Đánh giá 4⭐, còn 10 sản phẩm
- Drone (2 ETH) - Đánh giá 5⭐, còn 6 sản phẩm
- Headset (0.25 ETH) - Đánh giá 2⭐, còn 24 sản phẩm

👔 Clothing & Jewelry:
- Shoes (0.25 ETH) - Đánh giá 5⭐, còn 3 sản phẩm
- Sunglasses (0.10 ETH) - Đánh giá 4⭐, còn 12 sản phẩm
- Watch (1.25 ETH) - Đánh giá 4⭐, HẾT HÀNG

🎮 Toys & Gaming:
- Puzzle Cube (0.05 ETH) - Đánh giá 4⭐, còn 15 sản phẩm
- Train Set (0.20 ETH) - Đánh giá 4⭐, HẾT HÀNG
- Robot Set (0.15 ETH) - Đánh giá 3⭐, còn 12 sản phẩm

**Vai trò của bạn:**
- Trả lời câu hỏi về sản phẩm, giá cả, tồn kho
- Giải thích về blockchain, Ethereum, smart contracts
- Hướng dẫn cài đặt và sử dụng MetaMask
- Giúp người dùng hiểu cách mua hàng trên Dappazon
- Hỗ trợ cả tiếng Việt và tiếng Anh
- Giữ câu trả lời ngắn gọn, thân thiện, dễ hiểu

Hãy trả lời một cách tự nhiên, hữu ích và chuyên nghiệp!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptSource {
    Live,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemPrompt {
    pub text: String,
    pub source: PromptSource,
}

impl SystemPrompt {
    pub fn fallback() -> Self {
        Self { text: FALLBACK_PROMPT.to_string(), source: PromptSource::Fallback }
    }

    pub fn advertises_actions(&self) -> bool {
        self.source == PromptSource::Live
    }
}

pub struct PromptComposer {
    catalog: Arc<dyn CatalogSource>,
    item_count: u64,
}

impl PromptComposer {
    pub fn new(catalog: Arc<dyn CatalogSource>, item_count: u64) -> Self {
        Self { catalog, item_count }
    }

    /// Reads the catalog afresh and renders the prompt. Never fails: a
    /// ledger error degrades to the fallback prompt.
    pub async fn compose(&self, correlation_id: &str) -> SystemPrompt {
        match read_snapshot(self.catalog.as_ref(), self.item_count).await {
            Ok(snapshot) => {
                SystemPrompt { text: render_live(&snapshot), source: PromptSource::Live }
            }
            Err(error) => {
                tracing::warn!(
                    event_name = "agent.prompt.snapshot_unavailable",
                    correlation_id = %correlation_id,
                    error = %error,
                    "catalog snapshot unavailable, using fallback prompt"
                );
                SystemPrompt::fallback()
            }
        }
    }
}

pub fn render_live(snapshot: &CatalogSnapshot) -> String {
    let mut sections = vec![INTRO.to_string()];

    let mut catalog =
        String::from("**Danh mục sản phẩm (DỮ LIỆU THỜI GIAN THỰC TỪ BLOCKCHAIN):**");
    for (category, entries) in snapshot.categories() {
        catalog.push_str("\n\n");
        catalog.push_str(&format!("{}:\n", category.header()));
        let lines: Vec<String> = entries.iter().map(render_entry).collect();
        catalog.push_str(&lines.join("\n"));
    }
    sections.push(catalog);

    sections.push(PURCHASE_GUIDE.to_string());
    sections.push(LIVE_ROLE.to_string());
    sections.push(render_action_grammar(snapshot));
    sections.push(ACTION_EXAMPLES.to_string());
    sections.push(WEB_SEARCH_RULES.to_string());
    sections.push(LIVE_CLOSING.to_string());

    sections.join("\n\n")
}

/// `- Drone (2.0 ETH) - Đánh giá ⭐⭐⭐⭐⭐, còn 6 sản phẩm`
pub fn render_entry(entry: &CatalogEntry) -> String {
    let stock = if entry.in_stock() {
        format!("còn {} sản phẩm", entry.stock)
    } else {
        "HẾT HÀNG".to_string()
    };
    format!(
        "- {} ({} ETH) - Đánh giá {}, {}",
        entry.name,
        entry.price_ether(),
        entry.stars(),
        stock
    )
}

fn render_action_grammar(snapshot: &CatalogSnapshot) -> String {
    let ids: Vec<String> =
        snapshot.entries().map(|entry| format!("{} = {}", entry.name, entry.id)).collect();
    let id_lines: Vec<String> =
        ids.chunks(6).map(|chunk| format!("- {}", chunk.join(", "))).collect();
    let categories: Vec<&str> =
        snapshot.categories().map(|(category, _)| category.as_str()).collect();

    format!(
        "**QUAN TRỌNG - ACTIONS:**
Khi người dùng muốn xem sản phẩm cụ thể, thêm action tag vào cuối response:

Danh sách sản phẩm và ID:
{ids}

Các action có thể dùng:
- [ACTION:VIEW_PRODUCT:id] - Khi user muốn xem/mua sản phẩm. Ví dụ: [ACTION:VIEW_PRODUCT:2]
- [ACTION:VIEW_CATEGORY:category] - Khi user muốn xem danh mục ({categories})
- [ACTION:GO_HOME] - Khi user muốn về trang chủ
- [ACTION:GO_CART] - Khi user muốn xem giỏ hàng
- [ACTION:WEB_SEARCH:query] - Khi user hỏi về thông tin BÊN NGOÀI Dappazon (tin tức crypto, giá ETH, thông tin blockchain mới nhất, etc.)",
        ids = id_lines.join("\n"),
        categories = categories.join("/"),
    )
}
