use embedded_hal::digital::OutputPin;

use crate::{AuthMode, Error, IrqSignal, Transport, RC522};

const CLASSIC_1K_SECTORS: u8 = 16;
const BLOCKS_PER_SECTOR: u8 = 4;

#[allow(async_fn_in_trait)]
pub trait Rc522Debug {
    type BusError;

    /// Log every block of a MIFARE Classic 1K at debug level. The card has
    /// to be selected; it is halted afterwards even if a sector fails.
    async fn dump_classic_1k(
        &mut self,
        uid: &[u8; 4],
        key: &[u8; 6],
    ) -> Result<(), Error<Self::BusError>>;
}

impl<T, C, I> Rc522Debug for RC522<T, C, I>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    type BusError = T::Error;

    async fn dump_classic_1k(
        &mut self,
        uid: &[u8; 4],
        key: &[u8; 6],
    ) -> Result<(), Error<Self::BusError>> {
        let mut res = Ok(());
        for sector in 0..CLASSIC_1K_SECTORS {
            res = dump_sector(self, sector, uid, key).await;
            if res.is_err() {
                break;
            }
        }

        self.halt().await?;
        self.stop_crypto().await?;
        res
    }
}

async fn dump_sector<T, C, I>(
    rc522: &mut RC522<T, C, I>,
    sector: u8,
    uid: &[u8; 4],
    key: &[u8; 6],
) -> Result<(), Error<T::Error>>
where
    T: Transport,
    C: OutputPin,
    I: IrqSignal,
{
    let first_block = sector * BLOCKS_PER_SECTOR;
    rc522
        .card_auth(AuthMode::KeyA, first_block, key, uid)
        .await?;

    for block in first_block..first_block + BLOCKS_PER_SECTOR {
        let data = rc522.read(block).await?;
        log::debug!("S{sector} B{block} {:02x?}", data);
    }

    Ok(())
}
