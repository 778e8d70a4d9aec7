//! NSE Reference Table
//!
//! Static list of NSE-listed equities plus the headline indices. Symbols are
//! bare exchange codes; the `.NS` suffix is added by callers.

use std::collections::HashMap;

use crate::application::ports::{ReferenceStock, ReferenceTable};

const fn stock(symbol: &'static str, name: &'static str, sector: &'static str) -> ReferenceStock {
    ReferenceStock {
        symbol,
        name,
        sector,
    }
}

static NSE_STOCKS: &[ReferenceStock] = &[
    // NIFTY 50
    stock("RELIANCE", "Reliance Industries Ltd.", "Energy"),
    stock("TCS", "Tata Consultancy Services Ltd.", "IT"),
    stock("HDFCBANK", "HDFC Bank Ltd.", "Banking"),
    stock("INFY", "Infosys Ltd.", "IT"),
    stock("ICICIBANK", "ICICI Bank Ltd.", "Banking"),
    stock("HINDUNILVR", "Hindustan Unilever Ltd.", "FMCG"),
    stock("ITC", "ITC Ltd.", "FMCG"),
    stock("SBIN", "State Bank of India", "Banking"),
    stock("BHARTIARTL", "Bharti Airtel Ltd.", "Telecom"),
    stock("KOTAKBANK", "Kotak Mahindra Bank Ltd.", "Banking"),
    stock("LT", "Larsen & Toubro Ltd.", "Infrastructure"),
    stock("AXISBANK", "Axis Bank Ltd.", "Banking"),
    stock("ASIANPAINT", "Asian Paints Ltd.", "Chemicals"),
    stock("MARUTI", "Maruti Suzuki India Ltd.", "Automobile"),
    stock("SUNPHARMA", "Sun Pharmaceutical Industries Ltd.", "Pharma"),
    stock("TITAN", "Titan Company Ltd.", "Consumer"),
    stock("BAJFINANCE", "Bajaj Finance Ltd.", "Finance"),
    stock("BAJFINSV", "Bajaj Finserv Ltd.", "Finance"),
    stock("WIPRO", "Wipro Ltd.", "IT"),
    stock("HCLTECH", "HCL Technologies Ltd.", "IT"),
    stock("NTPC", "NTPC Ltd.", "Power"),
    stock("POWERGRID", "Power Grid Corporation of India Ltd.", "Power"),
    stock("TATAMOTORS", "Tata Motors Ltd.", "Automobile"),
    stock("ULTRACEMCO", "UltraTech Cement Ltd.", "Cement"),
    stock("ONGC", "Oil & Natural Gas Corporation Ltd.", "Energy"),
    stock("M&M", "Mahindra & Mahindra Ltd.", "Automobile"),
    stock("NESTLEIND", "Nestle India Ltd.", "FMCG"),
    stock("JSWSTEEL", "JSW Steel Ltd.", "Metals"),
    stock("TATASTEEL", "Tata Steel Ltd.", "Metals"),
    stock("ADANIENT", "Adani Enterprises Ltd.", "Diversified"),
    stock("ADANIPORTS", "Adani Ports & SEZ Ltd.", "Infrastructure"),
    stock("TECHM", "Tech Mahindra Ltd.", "IT"),
    stock("INDUSINDBK", "IndusInd Bank Ltd.", "Banking"),
    stock("DRREDDY", "Dr. Reddy's Laboratories Ltd.", "Pharma"),
    stock("DIVISLAB", "Divi's Laboratories Ltd.", "Pharma"),
    stock("CIPLA", "Cipla Ltd.", "Pharma"),
    stock("GRASIM", "Grasim Industries Ltd.", "Cement"),
    stock("BRITANNIA", "Britannia Industries Ltd.", "FMCG"),
    stock("EICHERMOT", "Eicher Motors Ltd.", "Automobile"),
    stock("HEROMOTOCO", "Hero MotoCorp Ltd.", "Automobile"),
    stock("APOLLOHOSP", "Apollo Hospitals Enterprise Ltd.", "Healthcare"),
    stock("COALINDIA", "Coal India Ltd.", "Mining"),
    stock("BPCL", "Bharat Petroleum Corporation Ltd.", "Energy"),
    stock("SBILIFE", "SBI Life Insurance Company Ltd.", "Insurance"),
    stock("HDFCLIFE", "HDFC Life Insurance Company Ltd.", "Insurance"),
    stock("BAJAJ-AUTO", "Bajaj Auto Ltd.", "Automobile"),
    stock("HINDALCO", "Hindalco Industries Ltd.", "Metals"),
    stock("TATACONSUM", "Tata Consumer Products Ltd.", "FMCG"),
    stock("WIPRO", "Wipro Ltd.", "IT"),
    stock("UPL", "UPL Ltd.", "Chemicals"),

    // NIFTY Next 50 and popular mid-caps
    stock("ADANIGREEN", "Adani Green Energy Ltd.", "Energy"),
    stock("ADANIPOWER", "Adani Power Ltd.", "Power"),
    stock("AMBUJACEM", "Ambuja Cements Ltd.", "Cement"),
    stock("AUROPHARMA", "Aurobindo Pharma Ltd.", "Pharma"),
    stock("BANKBARODA", "Bank of Baroda", "Banking"),
    stock("BEL", "Bharat Electronics Ltd.", "Defence"),
    stock("BERGEPAINT", "Berger Paints India Ltd.", "Chemicals"),
    stock("BIOCON", "Biocon Ltd.", "Pharma"),
    stock("CANBK", "Canara Bank", "Banking"),
    stock("CHOLAFIN", "Cholamandalam Investment & Finance Co.", "Finance"),
    stock("COLPAL", "Colgate-Palmolive (India) Ltd.", "FMCG"),
    stock("CONCOR", "Container Corporation of India Ltd.", "Logistics"),
    stock("DABUR", "Dabur India Ltd.", "FMCG"),
    stock("DLF", "DLF Ltd.", "Real Estate"),
    stock("FEDERALBNK", "Federal Bank Ltd.", "Banking"),
    stock("GAIL", "GAIL (India) Ltd.", "Energy"),
    stock("GODREJCP", "Godrej Consumer Products Ltd.", "FMCG"),
    stock("GODREJPROP", "Godrej Properties Ltd.", "Real Estate"),
    stock("HAL", "Hindustan Aeronautics Ltd.", "Defence"),
    stock("HAVELLS", "Havells India Ltd.", "Electricals"),
    stock("IDFCFIRSTB", "IDFC First Bank Ltd.", "Banking"),
    stock("INDIANB", "Indian Bank", "Banking"),
    stock("INDIGO", "InterGlobe Aviation Ltd.", "Aviation"),
    stock("IOC", "Indian Oil Corporation Ltd.", "Energy"),
    stock("IRCTC", "Indian Railway Catering & Tourism Corp.", "Tourism"),
    stock("IRFC", "Indian Railway Finance Corporation Ltd.", "Finance"),
    stock("JINDALSTEL", "Jindal Steel & Power Ltd.", "Metals"),
    stock("JUBLFOOD", "Jubilant FoodWorks Ltd.", "Consumer"),
    stock("LICHSGFIN", "LIC Housing Finance Ltd.", "Finance"),
    stock("LICI", "Life Insurance Corporation of India", "Insurance"),
    stock("LTIM", "LTIMindtree Ltd.", "IT"),
    stock("LTTS", "L&T Technology Services Ltd.", "IT"),
    stock("LUPIN", "Lupin Ltd.", "Pharma"),
    stock("MARICO", "Marico Ltd.", "FMCG"),
    stock("MAXHEALTH", "Max Healthcare Institute Ltd.", "Healthcare"),
    stock("MCX", "Multi Commodity Exchange of India Ltd.", "Exchange"),
    stock("MFSL", "Max Financial Services Ltd.", "Finance"),
    stock("MOTHERSON", "Motherson Sumi Wiring India Ltd.", "Auto Ancillary"),
    stock("MPHASIS", "MphasiS Ltd.", "IT"),
    stock("MRF", "MRF Ltd.", "Tyres"),
    stock("MUTHOOTFIN", "Muthoot Finance Ltd.", "Finance"),
    stock("NAUKRI", "Info Edge (India) Ltd.", "IT"),
    stock("NHPC", "NHPC Ltd.", "Power"),
    stock("NMDC", "NMDC Ltd.", "Mining"),
    stock("OBEROIRLTY", "Oberoi Realty Ltd.", "Real Estate"),
    stock("OFSS", "Oracle Financial Services Software Ltd.", "IT"),
    stock("PAYTM", "One 97 Communications Ltd.", "Fintech"),
    stock("PEL", "Piramal Enterprises Ltd.", "Diversified"),
    stock("PERSISTENT", "Persistent Systems Ltd.", "IT"),
    stock("PETRONET", "Petronet LNG Ltd.", "Energy"),
    stock("PFC", "Power Finance Corporation Ltd.", "Finance"),
    stock("PIDILITIND", "Pidilite Industries Ltd.", "Chemicals"),
    stock("PIIND", "PI Industries Ltd.", "Chemicals"),
    stock("PNB", "Punjab National Bank", "Banking"),
    stock("POLYCAB", "Polycab India Ltd.", "Electricals"),
    stock("RECLTD", "REC Ltd.", "Finance"),
    stock("SAIL", "Steel Authority of India Ltd.", "Metals"),
    stock("SHREECEM", "Shree Cement Ltd.", "Cement"),
    stock("SHRIRAMFIN", "Shriram Finance Ltd.", "Finance"),
    stock("SIEMENS", "Siemens Ltd.", "Industrials"),
    stock("SRF", "SRF Ltd.", "Chemicals"),
    stock("SYNGENE", "Syngene International Ltd.", "Pharma"),
    stock("TATACOMM", "Tata Communications Ltd.", "Telecom"),
    stock("TATAELXSI", "Tata Elxsi Ltd.", "IT"),
    stock("TATAPOWER", "Tata Power Company Ltd.", "Power"),
    stock("TORNTPHARM", "Torrent Pharmaceuticals Ltd.", "Pharma"),
    stock("TRENT", "Trent Ltd.", "Retail"),
    stock("UNIONBANK", "Union Bank of India", "Banking"),
    stock("VEDL", "Vedanta Ltd.", "Metals"),
    stock("VOLTAS", "Voltas Ltd.", "Consumer Durables"),
    stock("ZOMATO", "Zomato Ltd.", "Consumer"),
    stock("ZYDUSLIFE", "Zydus Lifesciences Ltd.", "Pharma"),

    // Other actively traded names
    stock("ABCAPITAL", "Aditya Birla Capital Ltd.", "Finance"),
    stock("ACC", "ACC Ltd.", "Cement"),
    stock("ALOKINDS", "Alok Industries Ltd.", "Textiles"),
    stock("ATUL", "Atul Ltd.", "Chemicals"),
    stock("BANDHANBNK", "Bandhan Bank Ltd.", "Banking"),
    stock("BATAINDIA", "Bata India Ltd.", "Consumer"),
    stock("BHEL", "Bharat Heavy Electricals Ltd.", "Capital Goods"),
    stock("BOSCHLTD", "Bosch Ltd.", "Auto Ancillary"),
    stock("CANFINHOME", "Can Fin Homes Ltd.", "Finance"),
    stock("CDSL", "Central Depository Services (India) Ltd.", "Exchange"),
    stock("CESC", "CESC Ltd.", "Power"),
    stock("COFORGE", "Coforge Ltd.", "IT"),
    stock("CROMPTON", "Crompton Greaves Consumer Electricals", "Electricals"),
    stock("CUB", "City Union Bank Ltd.", "Banking"),
    stock("CUMMINSIND", "Cummins India Ltd.", "Industrials"),
    stock("DEEPAKNTR", "Deepak Nitrite Ltd.", "Chemicals"),
    stock("DELHIVERY", "Delhivery Ltd.", "Logistics"),
    stock("DIXON", "Dixon Technologies (India) Ltd.", "Electronics"),
    stock("ESCORTS", "Escorts Kubota Ltd.", "Automobile"),
    stock("EXIDEIND", "Exide Industries Ltd.", "Auto Ancillary"),
    stock("FORTIS", "Fortis Healthcare Ltd.", "Healthcare"),
    stock("GMRINFRA", "GMR Airports Infrastructure Ltd.", "Infrastructure"),
    stock("GNFC", "Gujarat Narmada Valley Fertilizers & Chemicals", "Chemicals"),
    stock("GRANULES", "Granules India Ltd.", "Pharma"),
    stock("HAPPSTMNDS", "Happiest Minds Technologies Ltd.", "IT"),
    stock("HDFCAMC", "HDFC Asset Management Company Ltd.", "Finance"),
    stock("HINDPETRO", "Hindustan Petroleum Corporation Ltd.", "Energy"),
    stock("HONAUT", "Honeywell Automation India Ltd.", "Industrials"),
    stock("ICICIPRULI", "ICICI Prudential Life Insurance Co.", "Insurance"),
    stock("IDEA", "Vodafone Idea Ltd.", "Telecom"),
    stock("IEX", "Indian Energy Exchange Ltd.", "Exchange"),
    stock("IPCALAB", "Ipca Laboratories Ltd.", "Pharma"),
    stock("JKCEMENT", "JK Cement Ltd.", "Cement"),
    stock("JSWENERGY", "JSW Energy Ltd.", "Power"),
    stock("KALYANKJIL", "Kalyan Jewellers India Ltd.", "Consumer"),
    stock("KEI", "KEI Industries Ltd.", "Electricals"),
    stock("L&TFH", "L&T Finance Ltd.", "Finance"),
    stock("LAURUSLABS", "Laurus Labs Ltd.", "Pharma"),
    stock("MANAPPURAM", "Manappuram Finance Ltd.", "Finance"),
    stock("METROPOLIS", "Metropolis Healthcare Ltd.", "Healthcare"),
    stock("MINDTREE", "LTIMindtree Ltd.", "IT"),
    stock("NAM-INDIA", "Nippon Life India AMC Ltd.", "Finance"),
    stock("NATIONALUM", "National Aluminium Company Ltd.", "Metals"),
    stock("NIACL", "New India Assurance Company Ltd.", "Insurance"),
    stock("PAGEIND", "Page Industries Ltd.", "Textiles"),
    stock("PATANJALI", "Patanjali Foods Ltd.", "FMCG"),
    stock("PVRINOX", "PVR INOX Ltd.", "Entertainment"),
    stock("RAJESHEXPO", "Rajesh Exports Ltd.", "Consumer"),
    stock("RAMCOCEM", "The Ramco Cements Ltd.", "Cement"),
    stock("RBLBANK", "RBL Bank Ltd.", "Banking"),
    stock("SBICARD", "SBI Cards & Payment Services Ltd.", "Finance"),
    stock("SONACOMS", "Sona BLW Precision Forgings Ltd.", "Auto Ancillary"),
    stock("STAR", "Star Health & Allied Insurance Co.", "Insurance"),
    stock("SUNTV", "Sun TV Network Ltd.", "Media"),
    stock("SUPREMEIND", "Supreme Industries Ltd.", "Plastics"),
    stock("SUZLON", "Suzlon Energy Ltd.", "Energy"),
    stock("TVSMOTOR", "TVS Motor Company Ltd.", "Automobile"),
    stock("YESBANK", "Yes Bank Ltd.", "Banking"),
    stock("ZEEL", "Zee Entertainment Enterprises Ltd.", "Media"),

    // Indices
    stock("^NSEI", "NIFTY 50", "Index"),
    stock("^BSESN", "SENSEX", "Index"),
    stock("^NSEBANK", "NIFTY Bank", "Index"),
    stock("^CNXIT", "NIFTY IT", "Index"),
];

/// The built-in NSE table.
#[derive(Debug, Clone)]
pub struct NseReferenceTable {
    by_symbol: HashMap<&'static str, ReferenceStock>,
}

impl Default for NseReferenceTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NseReferenceTable {
    /// Build the table and its symbol index.
    #[must_use]
    pub fn new() -> Self {
        let mut by_symbol = HashMap::with_capacity(NSE_STOCKS.len());
        for stock in NSE_STOCKS {
            by_symbol.entry(stock.symbol).or_insert(*stock);
        }
        Self { by_symbol }
    }

    /// Exact lookup by bare symbol, case-insensitive.
    #[must_use]
    pub fn lookup(&self, symbol: &str) -> Option<ReferenceStock> {
        self.by_symbol
            .get(symbol.trim().to_uppercase().as_str())
            .copied()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        NSE_STOCKS.len()
    }

    /// Always false; the table is built in.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        NSE_STOCKS.is_empty()
    }
}

impl ReferenceTable for NseReferenceTable {
    fn entries(&self) -> &[ReferenceStock] {
        NSE_STOCKS
    }
}
