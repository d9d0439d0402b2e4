use std::borrow::Cow;

/// Provider identifier - mostly static constants ("binance", "CoinDesk", ...)
pub type ProviderId = Cow<'static, str>;
