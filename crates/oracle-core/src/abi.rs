//! Contract ABI bindings for the oracle surfaces the keeper talks to.

use alloy_sol_types::sol;

sol! {
    /// Source-chain block hash oracle: committers commit observed hashes,
    /// anyone may apply once the committer threshold is met.
    interface IBlockHashOracle {
        event CommitBlockHash(address indexed committer, uint256 indexed number, bytes32 hash);
        event ApplyBlockHash(uint256 indexed number, bytes32 hash);

        function commit(uint256 number, bytes32 hash) external;
        function apply(uint256 number, bytes32 hash, address[] committers) external;
        function get_block_hash(uint256 number) external view returns (bytes32);
        function threshold() external view returns (uint256);
    }
}

sol! {
    /// Destination-chain oracle variant whose no-arg apply pulls the hash
    /// from a bridge precompile and reports the applied number.
    interface IRollupBlockOracle {
        function apply() external returns (uint256);
    }
}

sol! {
    /// State prover: consumes the canonical header RLP and the proof
    /// bundle produced by this crate.
    interface IStateProver {
        function prove(bytes block_header_rlp, bytes proof_rlp) external returns (uint256);
    }
}
