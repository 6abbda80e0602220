use alloy::sol;

// ERC-8004 Identity Registry contract interface (ERC-721 based)
sol! {
    interface IIdentityRegistry {
        struct MetadataEntry {
            string key;
            bytes value;
        }

        // Registration overloads, in declaration order: register_0, register_1, register_2
        function register() external returns (uint256 agentId);
        function register(string calldata tokenUri) external returns (uint256 agentId);
        function register(string calldata tokenUri, MetadataEntry[] calldata metadata) external returns (uint256 agentId);

        function setAgentUri(uint256 agentId, string calldata newUri) external;
        function setMetadata(uint256 agentId, string calldata key, bytes calldata value) external;
        function getMetadata(uint256 agentId, string calldata key) external view returns (bytes memory);

        // ERC-721 standard
        function ownerOf(uint256 tokenId) external view returns (address);
        function tokenURI(uint256 tokenId) external view returns (string memory);
        function approve(address to, uint256 tokenId) external;
        function setApprovalForAll(address operator, bool approved) external;
        function getApproved(uint256 tokenId) external view returns (address);
        function isApprovedForAll(address owner, address operator) external view returns (bool);

        // Events
        event Registered(uint256 indexed agentId, string tokenURI, address indexed owner);
        event MetadataSet(uint256 indexed agentId, string indexed indexedKey, string key, bytes value);
    }
}

// ERC-8004 Reputation Registry contract interface
sol! {
    interface IReputationRegistry {
        // feedbackAuth is the 289-byte signed authorization payload
        function giveFeedback(
            uint256 agentId,
            uint8 score,
            bytes32 tag1,
            bytes32 tag2,
            string calldata feedbackUri,
            bytes32 feedbackHash,
            bytes calldata feedbackAuth
        ) external;

        function appendResponse(
            uint256 agentId,
            address clientAddress,
            uint64 feedbackIndex,
            string calldata responseUri,
            bytes32 responseHash
        ) external;

        function revokeFeedback(uint256 agentId, uint64 feedbackIndex) external;

        function getLastIndex(uint256 agentId, address clientAddress) external view returns (uint64);

        // Events
        event NewFeedback(
            uint256 indexed agentId,
            address indexed clientAddress,
            uint8 score,
            bytes32 indexed tag1,
            bytes32 tag2,
            string feedbackUri,
            bytes32 feedbackHash
        );

        event FeedbackRevoked(
            uint256 indexed agentId,
            address indexed clientAddress,
            uint64 indexed feedbackIndex
        );

        event ResponseAppended(
            uint256 indexed agentId,
            address indexed clientAddress,
            uint64 feedbackIndex,
            address indexed responder,
            string responseUri,
            bytes32 responseHash
        );
    }
}
