// 外部系統的具體實作：API、檔案系統、.docx、輸出端
pub mod docx;
pub mod filesystem;
pub mod http;
pub mod sink;
pub mod storage;
