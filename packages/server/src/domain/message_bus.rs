//! MessageBus trait 定義
//!
//! `publish` したエンベロープは、publish したノードを含む全ノードに少なくとも 1 回届く。
//! フィールドの値は変更されない。Room をまたいだ順序は保証しない。

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use super::{BusError, ChatEnvelope};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// クラスタの全購読者にエンベロープを publish
    async fn publish(&self, envelope: ChatEnvelope) -> Result<(), BusError>;

    /// 以降に publish されるエンベロープを購読
    fn subscribe(&self) -> BoxStream<'static, ChatEnvelope>;
}
