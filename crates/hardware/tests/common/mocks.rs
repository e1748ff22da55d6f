//! Mock implementations of simulator seams.

use mockall::mock;
use sspsim_core::common::error::ExecutionError;
use sspsim_core::isa::InstId;
use sspsim_core::isa::opcode::MemWidth;
use sspsim_core::soc::{DataPort, LoadResult};

// Data port with scripted loads and recorded stores.
mock! {
    pub Port {}

    impl DataPort for Port {
        fn load(
            &mut self,
            inst: InstId,
            addr: u64,
            width: MemWidth,
        ) -> Result<LoadResult, ExecutionError>;

        fn store(
            &mut self,
            inst: InstId,
            addr: u64,
            width: MemWidth,
            value: u64,
        ) -> Result<(), ExecutionError>;
    }
}
